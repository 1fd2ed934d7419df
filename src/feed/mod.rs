//! Price feed adapters module

mod investing;
pub mod markup;

use crate::error::Result;
use crate::models::RawQuote;
use async_trait::async_trait;

pub use investing::InvestingFeed;

/// Source of price quotes polled by the ingestion loop
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Feed ID used in logs
    fn id(&self) -> &'static str;

    /// Fetch the current quote. Any missing field or non-success response is an error.
    async fn fetch_quote(&self) -> Result<RawQuote>;
}
