//! Marker-based text extraction from HTML pages
//!
//! Elements are located by an attribute value (e.g. `data-test="instrument-price-last"`)
//! and their text content is returned with nested tags and comments removed.

use crate::error::{AppError, Result};
use scraper::{Html, Selector};

/// Text content of the first element carrying `attr="value"`, whitespace collapsed
pub fn element_text(document: &Html, attr: &str, value: &str) -> Result<Option<String>> {
    let selector = Selector::parse(&format!("[{}=\"{}\"]", attr, value))
        .map_err(|e| AppError::Internal(format!("Invalid selector for '{}': {:?}", value, e)))?;

    Ok(document.select(&selector).next().map(|element| {
        element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }))
}
