//! Price Service
//!
//! Read-only accessors over the history window and the price log.
//! Called by the REST API handlers.

use crate::error::{AppError, Result};
use crate::models::{LogEntry, Reading};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Row counts accepted by [`PriceService::last_prices`]
pub const ALLOWED_COUNTS: [usize; 4] = [10, 50, 100, 1000];

/// Count used when the request does not name one
pub const DEFAULT_COUNT: usize = 10;

/// Dashboard view of one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    pub timestamp: String,
    pub current_price: f64,
    pub predicted_price: Option<f64>,
}

impl From<&Reading> for DashboardEntry {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: reading.timestamp_label(),
            current_price: reading.price,
            predicted_price: reading.predicted_price,
        }
    }
}

/// Latest entry plus the whole window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResult {
    pub current: Option<DashboardEntry>,
    pub history: Vec<DashboardEntry>,
}

/// Price service for business logic
pub struct PriceService;

impl PriceService {
    /// Forecast attached to the most recent reading
    pub fn predicted_price(state: &AppState) -> Option<f64> {
        state.latest_reading().and_then(|r| r.predicted_price)
    }

    /// The whole history window, oldest first
    pub fn history(state: &AppState) -> Vec<Reading> {
        state.history_snapshot()
    }

    pub fn dashboard(state: &AppState) -> DashboardResult {
        let history: Vec<DashboardEntry> = state
            .history_snapshot()
            .iter()
            .map(DashboardEntry::from)
            .collect();

        DashboardResult {
            current: history.last().cloned(),
            history,
        }
    }

    /// Last rows of the price log. `count` must be one of [`ALLOWED_COUNTS`].
    pub fn last_prices(state: &AppState, count: Option<&str>) -> Result<Vec<LogEntry>> {
        let count = Self::parse_count(count)?;
        info!("PriceService::last_prices - {}", count);
        state.log.last_entries(count)
    }

    fn parse_count(count: Option<&str>) -> Result<usize> {
        let count = match count {
            None => return Ok(DEFAULT_COUNT),
            Some(raw) => raw.trim().parse::<usize>().ok(),
        };

        count
            .filter(|c| ALLOWED_COUNTS.contains(c))
            .ok_or_else(|| {
                AppError::Validation(
                    "Invalid count value. Please use 10, 50, 100, or 1000.".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::feed::testing::StaticFeed;
    use crate::services::IngestionService;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_parse_count() {
        assert_eq!(PriceService::parse_count(None).unwrap(), 10);
        assert_eq!(PriceService::parse_count(Some("50")).unwrap(), 50);
        assert_eq!(PriceService::parse_count(Some("1000")).unwrap(), 1000);
        assert!(matches!(
            PriceService::parse_count(Some("7")),
            Err(AppError::Validation(_))
        ));
        assert!(PriceService::parse_count(Some("ten")).is_err());
        assert!(PriceService::parse_count(Some("-10")).is_err());
    }

    #[tokio::test]
    async fn test_dashboard_and_prediction() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            log_path: dir.path().join("prices.csv"),
            ..AppConfig::default()
        };
        let feed = StaticFeed::with_prices(&["50", "52"]);
        let state = AppState::with_feed(config, Arc::new(feed)).unwrap();

        assert!(PriceService::predicted_price(&state).is_none());
        let empty = PriceService::dashboard(&state);
        assert!(empty.current.is_none());
        assert!(empty.history.is_empty());

        IngestionService::ingest(&state).await.unwrap();
        IngestionService::ingest(&state).await.unwrap();

        let predicted = PriceService::predicted_price(&state).unwrap();
        assert!((predicted - 54.0).abs() < 1e-9);

        let dashboard = PriceService::dashboard(&state);
        assert_eq!(dashboard.history.len(), 2);
        let current = dashboard.current.unwrap();
        assert_eq!(current.current_price, 52.0);
        assert_eq!(current.predicted_price, Some(predicted));

        let rows = PriceService::last_prices(&state, Some("10")).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
