use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use klaxon_core::alert::Alert;
use klaxon_core::error::DomainError;
use klaxon_core::events::DomainEvent;
use klaxon_core::ids::IncidentId;
use klaxon_core::incident::{Action, Incident, Status};
use klaxon_ports::types::RegistrySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created(IncidentId),
    Merged(IncidentId),
}

#[derive(Default)]
struct RegistryState {
    /// Index into `history`; only ever points at the last, non-closed entry.
    active: Option<usize>,
    history: Vec<Incident>,
}

impl RegistryState {
    fn active(&self) -> Option<&Incident> {
        self.active.and_then(|idx| self.history.get(idx))
    }

    fn active_mut(&mut self) -> Option<&mut Incident> {
        self.active.and_then(|idx| self.history.get_mut(idx))
    }

    fn find(&self, id: IncidentId) -> Option<&Incident> {
        self.history
            .iter()
            .rev()
            .find(|incident| incident.id() == id)
    }

    fn find_mut(&mut self, id: IncidentId) -> Option<&mut Incident> {
        self.history
            .iter_mut()
            .rev()
            .find(|incident| incident.id() == id)
    }

    fn active_matching(&mut self, requested: IncidentId) -> Result<&mut Incident, DomainError> {
        let incident = self.active_mut().ok_or(DomainError::NoActiveIncident)?;
        if incident.id() != requested {
            return Err(DomainError::IdMismatch {
                active: incident.id(),
                requested,
            });
        }
        Ok(incident)
    }

    fn create(
        &mut self,
        name: String,
        severity: String,
        now: DateTime<Utc>,
    ) -> Result<(IncidentId, Vec<DomainEvent>), DomainError> {
        if let Some(active) = self.active() {
            return Err(DomainError::IncidentAlreadyActive(active.id()));
        }
        let (incident, events) = Incident::new(name, severity, now);
        let id = incident.id();
        self.history.push(incident);
        self.active = Some(self.history.len() - 1);
        Ok((id, events))
    }
}

/// Owner of the active incident and the incident history.
///
/// Every read and write of incident state goes through one mutex. Domain
/// events are published while the lock is held so subscribers observe them
/// in the same order as the state changes.
#[derive(Clone)]
pub struct IncidentRegistry {
    state: Arc<Mutex<RegistryState>>,
    events: mpsc::UnboundedSender<DomainEvent>,
}

impl IncidentRegistry {
    pub fn new(events: mpsc::UnboundedSender<DomainEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            events,
        }
    }

    /// Merges the alert into the active incident, or opens a new one.
    pub async fn ingest(
        &self,
        alert: Alert,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome, DomainError> {
        let mut state = self.state.lock().await;
        let (outcome, events) = if let Some(incident) = state.active_mut() {
            let id = incident.id();
            let events = incident.merge_alert(alert, now)?;
            debug!(
                incident_id = %id,
                alerts = incident.alerts().len(),
                "alert merged into active incident"
            );
            (IngestOutcome::Merged(id), events)
        } else {
            let (id, events) = state.create(alert.name, alert.severity, now)?;
            info!(incident_id = %id, "incident created");
            (IngestOutcome::Created(id), events)
        };
        self.publish(events);
        Ok(outcome)
    }

    pub async fn create_new(
        &self,
        name: impl Into<String>,
        severity: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<IncidentId, DomainError> {
        let mut state = self.state.lock().await;
        match state.create(name.into(), severity.into(), now) {
            Ok((id, events)) => {
                info!(incident_id = %id, "incident created");
                self.publish(events);
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "refusing to open a second incident");
                Err(e)
            }
        }
    }

    pub async fn acknowledge(
        &self,
        incident_id: IncidentId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let events = state.active_matching(incident_id)?.acknowledge(now)?;
        if !events.is_empty() {
            info!(%incident_id, "incident acknowledged");
        }
        self.publish(events);
        Ok(())
    }

    /// Closes the active incident and frees the active slot.
    pub async fn close(
        &self,
        incident_id: IncidentId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let events = state.active_matching(incident_id)?.close(now)?;
        state.active = None;
        info!(%incident_id, "incident closed");
        self.publish(events);
        Ok(())
    }

    pub async fn status_of(&self, incident_id: IncidentId) -> Option<Status> {
        let state = self.state.lock().await;
        state.find(incident_id).map(Incident::status)
    }

    pub async fn record_action(
        &self,
        incident_id: IncidentId,
        action: Action,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let incident = state
            .find_mut(incident_id)
            .ok_or(DomainError::UnknownIncident(incident_id))?;
        incident.record_action(action);
        Ok(())
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock().await;
        RegistrySnapshot {
            active: state.active().cloned(),
            history: state.history.clone(),
        }
    }

    fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let event_type = event.event_type();
            let incident_id = event.incident_id();
            let occurred_at = event.occurred_at();
            if self.events.send(event).is_err() {
                warn!(
                    event_type,
                    %incident_id,
                    %occurred_at,
                    "event channel closed, dropping event"
                );
            } else {
                debug!(event_type, %incident_id, %occurred_at, "event published");
            }
        }
    }
}
