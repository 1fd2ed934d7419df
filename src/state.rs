//! Application state management

use crate::config::AppConfig;
use crate::error::Result;
use crate::feed::{InvestingFeed, PriceFeed};
use crate::history::HistoryBuffer;
use crate::models::Reading;
use crate::storage::PriceLog;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where the ingestion loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestPhase {
    Idle,
    Fetching,
}

/// Outcome of the most recent ingestion tick
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickStatus {
    #[serde(with = "crate::models::timestamp_format")]
    pub at: NaiveDateTime,
    pub success: bool,
    pub error: Option<String>,
}

/// Application state shared between the ingestion loop and the API
pub struct AppState {
    pub config: AppConfig,

    /// Quote source polled by the ingestion loop
    pub feed: Arc<dyn PriceFeed>,

    /// Persisted price log
    pub log: Arc<PriceLog>,

    /// Recent readings; written only by the ingestion loop
    history: RwLock<HistoryBuffer>,

    /// Set while the log cannot be written and readings are kept in memory only
    storage_degraded: AtomicBool,

    phase: RwLock<IngestPhase>,

    last_tick: RwLock<Option<TickStatus>>,
}

impl AppState {
    /// Create state with the scraping feed and the log at `config.log_path`
    pub fn new(config: AppConfig) -> Result<Self> {
        let feed = Arc::new(InvestingFeed::new(&config)?);
        Self::with_feed(config, feed)
    }

    /// Create state around an arbitrary feed
    pub fn with_feed(config: AppConfig, feed: Arc<dyn PriceFeed>) -> Result<Self> {
        config.validate()?;

        let log = Arc::new(PriceLog::open(config.log_path.clone())?);
        let history = HistoryBuffer::new(config.history_capacity);

        tracing::info!(
            "History capacity {}, forecasting {}",
            config.history_capacity,
            if config.forecast_enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            config,
            feed,
            log,
            history: RwLock::new(history),
            storage_degraded: AtomicBool::new(false),
            phase: RwLock::new(IngestPhase::Idle),
            last_tick: RwLock::new(None),
        })
    }

    /// Copy of the history window, oldest first
    pub fn history_snapshot(&self) -> Vec<Reading> {
        self.history.read().snapshot()
    }

    /// Most recent reading, if any were ingested
    pub fn latest_reading(&self) -> Option<Reading> {
        self.history.read().latest().cloned()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Run `f` with exclusive access to the history window
    pub(crate) fn with_history_mut<T>(&self, f: impl FnOnce(&mut HistoryBuffer) -> T) -> T {
        let mut history = self.history.write();
        f(&mut history)
    }

    pub fn is_storage_degraded(&self) -> bool {
        self.storage_degraded.load(Ordering::SeqCst)
    }

    /// Flip the degraded flag, returning the previous value
    pub fn set_storage_degraded(&self, degraded: bool) -> bool {
        self.storage_degraded.swap(degraded, Ordering::SeqCst)
    }

    pub fn phase(&self) -> IngestPhase {
        *self.phase.read()
    }

    pub fn set_phase(&self, phase: IngestPhase) {
        *self.phase.write() = phase;
    }

    pub fn last_tick(&self) -> Option<TickStatus> {
        self.last_tick.read().clone()
    }

    pub fn record_tick(&self, status: TickStatus) {
        *self.last_tick.write() = Some(status);
    }
}
