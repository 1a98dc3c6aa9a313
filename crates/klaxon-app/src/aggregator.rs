use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use klaxon_core::alert::Alert;
use klaxon_ports::error::IntakeError;

use crate::registry::{IncidentRegistry, IngestOutcome};

pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

/// Producer side of the bounded alert queue.
#[derive(Clone)]
pub struct AlertIntake {
    queue: mpsc::Sender<Alert>,
}

impl AlertIntake {
    /// Enqueues without waiting. A full queue sheds the alert.
    pub fn submit(&self, alert: Alert) -> Result<(), IntakeError> {
        match self.queue.try_send(alert) {
            Ok(()) => {
                debug!("alert queued");
                Ok(())
            }
            Err(TrySendError::Full(alert)) => {
                warn!(alert = %alert, "alert queue is full, dropping alert");
                Err(IntakeError::QueueFull)
            }
            Err(TrySendError::Closed(alert)) => {
                error!(alert = %alert, "alert queue is closed, dropping alert");
                Err(IntakeError::Closed)
            }
        }
    }
}

/// Drains the alert queue into the registry, one alert at a time.
pub struct AlertAggregator {
    registry: IncidentRegistry,
    queue: mpsc::Receiver<Alert>,
}

impl AlertAggregator {
    pub fn new(registry: IncidentRegistry, capacity: usize) -> (AlertIntake, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            AlertIntake { queue: tx },
            Self {
                registry,
                queue: rx,
            },
        )
    }

    pub async fn run(mut self) {
        info!("alert aggregator started");
        while let Some(alert) = self.queue.recv().await {
            self.process(alert).await;
        }
        info!("alert queue closed, aggregator stopped");
    }

    async fn process(&self, alert: Alert) {
        let name = alert.name.clone();
        match self.registry.ingest(alert, Utc::now()).await {
            Ok(IngestOutcome::Created(incident_id)) => {
                info!(%incident_id, alert = %name, "alert opened a new incident");
            }
            Ok(IngestOutcome::Merged(incident_id)) => {
                debug!(%incident_id, alert = %name, "alert merged");
            }
            // ingest decides merge or create under the registry lock, so the
            // active incident is never closed and never doubled here.
            Err(e) => {
                error!(alert = %name, error = %e, "registry rejected alert");
                debug_assert!(false, "registry invariant violated: {e}");
            }
        }
    }
}
