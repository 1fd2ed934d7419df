//! Dashboard REST API module
//!
//! Provides:
//! - `GET /api/current-price` - fetch a quote now (through the ingestion loop)
//! - `GET /api/predicted-price` - forecast attached to the latest reading
//! - `GET /api/price-history` - the history window
//! - `GET /api/dashboard-data` - latest entry plus window, trimmed for charts
//! - `GET /api/last-prices?count=N` - tail of the price log
//! - `GET /health` - ingestion and storage status

pub mod handlers;
mod server;
mod types;

pub use handlers::ApiState;
pub use server::{router, ApiServer};
pub use types::{ErrorBody, HealthResponse, LastPricesQuery, PredictedPriceResponse};
