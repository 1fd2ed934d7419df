//! Price observation types shared by the feed, storage and API layers

use crate::error::{AppError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wall-clock format used in the log file and in API responses
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw field text extracted from the feed page, before numeric parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuote {
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub update_time: String,
}

/// One scraped observation with its optional one-step-ahead forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
    pub update_time: String,
    pub predicted_price: Option<f64>,

    /// Data-row index in the price log, absent when the append failed
    #[serde(skip)]
    pub row: Option<usize>,
}

impl Reading {
    /// Build a reading from raw feed text, normalizing the numeric fields
    pub fn from_quote(quote: &RawQuote, timestamp: NaiveDateTime) -> Result<Self> {
        Ok(Self {
            timestamp,
            price: parse_number(&quote.price, "price")?,
            change: parse_number(&quote.change, "change")?,
            percent_change: parse_percent(&quote.change_percent)?,
            update_time: quote.update_time.clone(),
            predicted_price: None,
            row: None,
        })
    }

    pub fn timestamp_label(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A log row exposed as-is (string fields, blank prediction becomes `None`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub price: String,
    pub change: String,
    pub percent_change: String,
    pub update_time: String,
    pub predicted_price: Option<String>,
}

/// Strip thousands separators and parse
pub fn parse_number(text: &str, field: &str) -> Result<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| AppError::Format(format!("Invalid {} value: {:?}", field, text)))
}

/// Parse a change-percent label such as `(+1.25%)`
pub fn parse_percent(text: &str) -> Result<f64> {
    let trimmed = text.trim().trim_matches(|c: char| c == '(' || c == ')' || c == '%');
    parse_number(trimmed, "change percent")
}

pub(crate) mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_from_quote_normalizes_numbers() {
        let quote = RawQuote {
            price: "1,078.45".into(),
            change: "-0.32".into(),
            change_percent: "(-0.41%)".into(),
            update_time: "14:29:58".into(),
        };

        let reading = Reading::from_quote(&quote, ts()).unwrap();
        assert_eq!(reading.price, 1078.45);
        assert_eq!(reading.change, -0.32);
        assert_eq!(reading.percent_change, -0.41);
        assert_eq!(reading.update_time, "14:29:58");
        assert!(reading.predicted_price.is_none());
    }

    #[test]
    fn test_percent_accepts_plus_sign() {
        assert_eq!(parse_percent("(+1.25%)").unwrap(), 1.25);
    }

    #[test]
    fn test_malformed_number_is_format_error() {
        let err = parse_number("n/a", "price").unwrap_err();
        assert!(matches!(err, AppError::Format(_)));
    }

    #[test]
    fn test_reading_json_shape() {
        let reading = Reading {
            timestamp: ts(),
            price: 78.5,
            change: 0.5,
            percent_change: 0.64,
            update_time: "14:30".into(),
            predicted_price: Some(79.0),
            row: Some(3),
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timestamp"], "2024-10-01 14:30:05");
        assert_eq!(json["percentChange"], 0.64);
        assert_eq!(json["updateTime"], "14:30");
        assert_eq!(json["predictedPrice"], 79.0);
        assert!(json.get("row").is_none());
    }
}
