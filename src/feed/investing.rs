//! Investing.com commodity page adapter

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::feed::markup::element_text;
use crate::feed::PriceFeed;
use crate::models::RawQuote;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use scraper::Html;
use tracing::debug;

const MARKER_ATTR: &str = "data-test";
const PRICE_MARKER: &str = "instrument-price-last";
const CHANGE_MARKER: &str = "instrument-price-change";
const CHANGE_PERCENT_MARKER: &str = "instrument-price-change-percent";
const TIME_MARKER: &str = "trading-time-label";

/// Scrapes the quote block of an Investing.com instrument page
pub struct InvestingFeed {
    client: Client,
    url: Url,
}

impl InvestingFeed {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .default_headers(Self::get_headers(&config.user_agent)?)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.feed_url.clone(),
        })
    }

    fn get_headers(user_agent: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| AppError::Config(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.8"));
        Ok(headers)
    }
}

#[async_trait]
impl PriceFeed for InvestingFeed {
    fn id(&self) -> &'static str {
        "investing"
    }

    async fn fetch_quote(&self) -> Result<RawQuote> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                message: "Failed to fetch data".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), self.url);
        parse_quote(&body)
    }
}

/// Pull the four quote fields out of the page body
pub fn parse_quote(html: &str) -> Result<RawQuote> {
    let document = Html::parse_document(html);
    let field = |marker: &str| {
        element_text(&document, MARKER_ATTR, marker)?
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::Parse(format!("Marker '{}' not found in page", marker)))
    };

    Ok(RawQuote {
        price: field(PRICE_MARKER)?,
        change: field(CHANGE_MARKER)?,
        change_percent: field(CHANGE_PERCENT_MARKER)?,
        update_time: field(TIME_MARKER)?,
    })
}
