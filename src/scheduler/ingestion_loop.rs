//! Periodic price ingestion
//!
//! Runs one ingestion pass every `ingest_interval`. Feed failures are logged
//! and the next tick is the retry. The API can request an out-of-schedule
//! pass through [`IngestionTrigger`]; it runs on the loop task like any
//! other tick, so the loop remains the only writer of the history window.

use crate::error::{AppError, Result};
use crate::models::Reading;
use crate::services::IngestionService;
use crate::state::{AppState, IngestPhase, TickStatus};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

type TriggerRequest = oneshot::Sender<Result<Reading>>;

/// Ingestion loop bound to the shared application state
pub struct IngestionLoop {
    state: Arc<AppState>,
}

impl IngestionLoop {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run a single ingestion pass and record its outcome
    pub async fn tick(&self) -> Result<Reading> {
        self.state.set_phase(IngestPhase::Fetching);
        let result = IngestionService::ingest(&self.state).await;
        self.state.set_phase(IngestPhase::Idle);

        let status = match &result {
            Ok(reading) => {
                info!(
                    "Ingested price {} ({:+}, {:+}%) at {}",
                    reading.price,
                    reading.change,
                    reading.percent_change,
                    reading.update_time
                );
                TickStatus {
                    at: Local::now().naive_local(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                if e.is_feed_failure() {
                    warn!("Ingestion tick failed via {}: {}", self.state.feed.id(), e);
                } else {
                    error!("Ingestion tick failed: {}", e);
                }
                TickStatus {
                    at: Local::now().naive_local(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        };
        self.state.record_tick(status);

        result
    }

    /// Start the loop on the tokio runtime
    ///
    /// The first tick fires immediately. Ticks that fall behind a slow fetch
    /// are delayed rather than bursted.
    pub fn spawn(self) -> IngestionHandle {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<TriggerRequest>(8);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.state.config.ingest_interval;

        let task = tokio::spawn(async move {
            info!("Ingestion loop started, every {:?}", period);

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        // Failures are already logged and recorded by tick()
                        let _ = self.tick().await;
                    }
                    Some(reply) = trigger_rx.recv() => {
                        let result = self.tick().await;
                        let _ = reply.send(result);
                    }
                }
            }

            info!("Ingestion loop stopped");
        });

        IngestionHandle {
            trigger: IngestionTrigger { tx: trigger_tx },
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Cloneable sender for on-demand ingestion passes
#[derive(Clone)]
pub struct IngestionTrigger {
    tx: mpsc::Sender<TriggerRequest>,
}

impl IngestionTrigger {
    /// Ask the loop for an immediate pass and wait for its result
    pub async fn fetch_now(&self) -> Result<Reading> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(reply_tx)
            .await
            .map_err(|_| AppError::Internal("Ingestion loop is not running".to_string()))?;

        reply_rx
            .await
            .map_err(|_| AppError::Internal("Ingestion loop stopped before replying".to_string()))?
    }
}

/// Control handle for a spawned ingestion loop
pub struct IngestionHandle {
    trigger: IngestionTrigger,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl IngestionHandle {
    pub fn trigger(&self) -> IngestionTrigger {
        self.trigger.clone()
    }

    /// Signal the loop to stop after the current pass
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
            info!("Ingestion loop stop signal sent");
        }
    }

    /// Stop the loop and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Ingestion loop task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for IngestionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
