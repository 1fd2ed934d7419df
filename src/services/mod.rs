//! Services Layer
//!
//! Business logic shared by the ingestion loop and the REST API handlers.
//!
//! # Architecture
//!
//! ```text
//! Ingestion Loop --> IngestionService --> Feed / PriceLog / History
//! REST API ------->  PriceService ------> History / PriceLog (read-only)
//! ```
//!
//! # Services
//!
//! - `IngestionService` - Fetch, persist, window and forecast one reading
//! - `PriceService` - History, forecast, dashboard and log queries

pub mod ingestion_service;
pub mod price_service;

pub use ingestion_service::IngestionService;
pub use price_service::{DashboardEntry, DashboardResult, PriceService, ALLOWED_COUNTS};
