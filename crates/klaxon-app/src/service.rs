use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use klaxon_core::alert::Alert;
use klaxon_core::error::DomainError;
use klaxon_core::ids::IncidentId;
use klaxon_ports::error::IntakeError;
use klaxon_ports::inbound::{AlertReceiver, IncidentManager};
use klaxon_ports::types::RegistrySnapshot;

use crate::aggregator::{AlertAggregator, AlertIntake, DEFAULT_QUEUE_CAPACITY};
use crate::dispatcher::{NotificationDispatcher, NotificationRoute, DEFAULT_NOTIFY_INTERVAL};
use crate::registry::IncidentRegistry;
use crate::trigger::EventNotifierTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub queue_capacity: usize,
    pub notify_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            notify_interval: DEFAULT_NOTIFY_INTERVAL,
        }
    }
}

/// Background workers owned by a running service.
pub struct ServiceTasks {
    pub aggregator: JoinHandle<()>,
    pub trigger: JoinHandle<()>,
}

/// Boundary facade over the alert queue and the incident registry.
#[derive(Clone)]
pub struct IncidentService {
    intake: AlertIntake,
    registry: IncidentRegistry,
}

impl IncidentService {
    /// Wires queue, registry, aggregator and trigger, and spawns the loops.
    pub fn start(
        settings: ServiceSettings,
        routes: Vec<NotificationRoute>,
    ) -> (Self, ServiceTasks) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let registry = IncidentRegistry::new(events_tx);
        let (intake, aggregator) = AlertAggregator::new(registry.clone(), settings.queue_capacity);
        let dispatcher =
            NotificationDispatcher::new(registry.clone(), routes, settings.notify_interval);
        let trigger = EventNotifierTrigger::new(events_rx, dispatcher);

        let tasks = ServiceTasks {
            aggregator: tokio::spawn(aggregator.run()),
            trigger: tokio::spawn(trigger.run()),
        };
        (Self { intake, registry }, tasks)
    }
}

impl AlertReceiver for IncidentService {
    fn submit_alert(&self, alert: Alert) -> Result<(), IntakeError> {
        self.intake.submit(alert)
    }
}

#[async_trait]
impl IncidentManager for IncidentService {
    async fn acknowledge(&self, incident_id: IncidentId) -> Result<(), DomainError> {
        self.registry.acknowledge(incident_id, Utc::now()).await
    }

    async fn close(&self, incident_id: IncidentId) -> Result<(), DomainError> {
        self.registry.close(incident_id, Utc::now()).await
    }

    async fn current_state(&self) -> RegistrySnapshot {
        self.registry.snapshot().await
    }
}
