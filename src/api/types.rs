//! REST API types

use crate::error::AppError;
use crate::state::{IngestPhase, TickStatus};
use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let error = match err {
            AppError::Fetch { message, .. } => message.clone(),
            AppError::Validation(message) => message.clone(),
            other => other.to_string(),
        };

        Self {
            error,
            status_code: err.status_code(),
        }
    }
}

/// GET /api/predicted-price
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedPriceResponse {
    pub predicted_price: Option<f64>,
}

/// Query string of GET /api/last-prices
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastPricesQuery {
    pub count: Option<String>,
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub storage_degraded: bool,
    pub phase: IngestPhase,
    pub history_length: usize,
    pub history_capacity: usize,
    pub forecast_enabled: bool,
    pub last_tick: Option<TickStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_keeps_feed_status() {
        let err = AppError::Fetch {
            message: "Failed to fetch data".to_string(),
            status_code: Some(429),
        };
        let json = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(json["error"], "Failed to fetch data");
        assert_eq!(json["status_code"], 429);
    }

    #[test]
    fn test_error_body_omits_missing_status() {
        let json = serde_json::to_value(ErrorBody::from(&AppError::Parse("gone".into()))).unwrap();
        assert_eq!(json["error"], "Parse error: gone");
        assert!(json.get("status_code").is_none());
    }
}
