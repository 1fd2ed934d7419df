//! Ingestion Service
//!
//! One pass of the pipeline: fetch a quote, append it to the price log,
//! push it into the history window and refit the trend forecast.
//! Called by the ingestion loop only.

use crate::error::Result;
use crate::forecast::TrendForecaster;
use crate::history::shifted_row;
use crate::models::Reading;
use crate::state::AppState;
use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{debug, error, info};

/// Ingestion service for business logic
pub struct IngestionService;

impl IngestionService {
    /// Fetch and ingest one reading.
    ///
    /// Feed failures return before anything is mutated. A log failure does
    /// not fail the pass: the reading is kept in memory and storage is flagged
    /// as degraded until the next successful append.
    pub async fn ingest(state: &AppState) -> Result<Reading> {
        let quote = state.feed.fetch_quote().await?;
        let mut reading = Reading::from_quote(&quote, now_seconds())?;

        match state.log.append(&reading) {
            Ok(row) => {
                reading.row = Some(row);
                if state.set_storage_degraded(false) {
                    info!("Price log writable again, leaving memory-only mode");
                }
            }
            Err(e) => {
                error!("Failed to append to price log, keeping reading in memory: {}", e);
                state.set_storage_degraded(true);
            }
        }

        let forecast_enabled = state.config.forecast_enabled;
        let mut latest = reading.clone();
        let updates = state.with_history_mut(|history| {
            history.push(reading);
            if !forecast_enabled {
                return Vec::new();
            }

            let predictions = TrendForecaster::prefix_predictions(&history.prices());
            let annotated = history.annotate(&predictions);
            latest.predicted_price = history.latest().and_then(|r| r.predicted_price);

            annotated
                .into_iter()
                .filter_map(|entry| entry.row.zip(entry.predicted_price))
                .collect::<Vec<_>>()
        });

        if !updates.is_empty() {
            if let Some(removed) = Self::persist_predictions(state, &updates) {
                state.with_history_mut(|history| history.shift_rows(&removed));
                latest.row = latest.row.map(|row| shifted_row(row, &removed));
            }
        }

        debug!(
            "Ingested reading: price={} predicted={:?}",
            latest.price, latest.predicted_price
        );
        Ok(latest)
    }

    /// Write new forecasts and compact the log. Returns the removed rows on success.
    fn persist_predictions(state: &AppState, updates: &[(usize, f64)]) -> Option<Vec<usize>> {
        let result = state
            .log
            .set_predictions(updates)
            .and_then(|_| state.log.compact());

        match result {
            Ok(removed) => {
                debug!(
                    "Wrote {} forecasts, log has {} rows",
                    updates.len(),
                    state.log.len()
                );
                Some(removed)
            }
            Err(e) => {
                error!("Failed to write forecasts to price log: {}", e);
                state.set_storage_degraded(true);
                None
            }
        }
    }
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
