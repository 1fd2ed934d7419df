//! Scheduler module
//!
//! Handles scheduled tasks:
//! - Periodic price ingestion (default every 10 seconds)
//! - On-demand ingestion requested by the API

mod ingestion_loop;

pub use ingestion_loop::{IngestionHandle, IngestionLoop, IngestionTrigger};
