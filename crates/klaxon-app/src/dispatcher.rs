use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use klaxon_core::channel::Target;
use klaxon_core::ids::IncidentId;
use klaxon_core::incident::{Action, Status};
use klaxon_ports::outbound::Notifier;
use klaxon_ports::types::Notification;

use crate::registry::IncidentRegistry;

pub const DEFAULT_NOTIFY_INTERVAL: Duration = Duration::from_secs(60);

/// A notifier paired with the destination it should deliver to.
#[derive(Clone)]
pub struct NotificationRoute {
    pub notifier: Arc<dyn Notifier>,
    pub target: Target,
}

impl NotificationRoute {
    pub fn new(notifier: Arc<dyn Notifier>, target: Target) -> Self {
        Self { notifier, target }
    }
}

pub fn incident_message(name: &str, severity: &str) -> String {
    format!("New Incident\n Name: {name}\n Severity: {severity}")
}

/// Re-notifies every route, in order, while an incident stays `new`.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: IncidentRegistry,
    routes: Arc<[NotificationRoute]>,
    interval: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        registry: IncidentRegistry,
        routes: Vec<NotificationRoute>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            routes: routes.into(),
            interval,
        }
    }

    /// Runs until the incident leaves `new` or `cancel` fires.
    ///
    /// Status is checked before each pass; cancellation is only observed
    /// between passes, so a pass that has started always completes.
    pub async fn run(&self, incident_id: IncidentId, message: String, cancel: CancellationToken) {
        info!(%incident_id, routes = self.routes.len(), "dispatcher started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.registry.status_of(incident_id).await {
                Some(Status::New) => {}
                status => {
                    debug!(%incident_id, ?status, "incident no longer new");
                    break;
                }
            }

            self.run_cycle(incident_id, &message).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(%incident_id, "dispatcher stopped");
    }

    /// One sequential pass over every route; returns how many delivered.
    pub async fn run_cycle(&self, incident_id: IncidentId, message: &str) -> usize {
        let mut delivered = 0;
        for route in self.routes.iter() {
            let channel = route.notifier.channel();
            let notification = Notification {
                incident_id,
                message: message.to_string(),
                target: route.target.clone(),
            };

            match route.notifier.notify(&notification).await {
                Ok(result) => {
                    delivered += 1;
                    info!(
                        %incident_id,
                        channel = channel.as_str(),
                        target = %route.target,
                        external_id = ?result.external_id,
                        "notification delivered"
                    );
                    let action = Action::new(channel, message, Utc::now());
                    if let Err(e) = self.registry.record_action(incident_id, action).await {
                        warn!(%incident_id, error = %e, "could not record action");
                    }
                }
                Err(e) => {
                    error!(
                        %incident_id,
                        channel = channel.as_str(),
                        target = %route.target,
                        error = %e,
                        "notification failed"
                    );
                }
            }
        }
        delivered
    }
}
