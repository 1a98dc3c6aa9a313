pub mod action;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::error::DomainError;
use crate::events::{
    AlertMerged, DomainEvent, IncidentAcknowledged, IncidentClosed, IncidentCreated,
};
use crate::ids::IncidentId;

pub use action::Action;
pub use status::Status;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    id: IncidentId,
    name: String,
    severity: String,
    status: Status,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    alerts: Vec<Alert>,
    actions: Vec<Action>,
}

impl Incident {
    /// Opens an incident seeded with the alert that triggered it.
    pub fn new(
        name: impl Into<String>,
        severity: impl Into<String>,
        now: DateTime<Utc>,
    ) -> (Self, Vec<DomainEvent>) {
        let id = IncidentId::new();
        let seed = Alert::new(name, severity);
        let incident = Self {
            id,
            name: seed.name.clone(),
            severity: seed.severity.clone(),
            status: Status::New,
            starts_at: now,
            ends_at: None,
            alerts: vec![seed],
            actions: Vec::new(),
        };
        let events = vec![DomainEvent::IncidentCreated(IncidentCreated {
            incident_id: id,
            name: incident.name.clone(),
            severity: incident.severity.clone(),
            occurred_at: now,
        })];
        (incident, events)
    }

    /// Appends an alert. Name and severity stay as seeded.
    pub fn merge_alert(
        &mut self,
        alert: Alert,
        now: DateTime<Utc>,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        if self.status == Status::Closed {
            return Err(DomainError::IncidentAlreadyClosed);
        }
        let alert_name = alert.name.clone();
        self.alerts.push(alert);
        Ok(vec![DomainEvent::AlertMerged(AlertMerged {
            incident_id: self.id,
            alert_name,
            alert_count: self.alerts.len(),
            occurred_at: now,
        })])
    }

    pub fn acknowledge(&mut self, now: DateTime<Utc>) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            Status::Closed => Err(DomainError::IncidentAlreadyClosed),
            Status::Acknowledged => Ok(vec![]),
            Status::New => {
                self.status = Status::Acknowledged;
                Ok(vec![DomainEvent::IncidentAcknowledged(
                    IncidentAcknowledged {
                        incident_id: self.id,
                        occurred_at: now,
                    },
                )])
            }
        }
    }

    pub fn close(&mut self, now: DateTime<Utc>) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            Status::Closed => Ok(vec![]),
            Status::New | Status::Acknowledged => {
                self.status = Status::Closed;
                self.ends_at = Some(now);
                Ok(vec![DomainEvent::IncidentClosed(IncidentClosed {
                    incident_id: self.id,
                    occurred_at: now,
                })])
            }
        }
    }

    pub fn record_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn id(&self) -> IncidentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    fn now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn later() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn make_incident() -> Incident {
        let (incident, _) = Incident::new("disk-full", "critical", now());
        incident
    }

    #[test]
    fn new_incident_is_seeded_with_its_alert() {
        let (incident, events) = Incident::new("disk-full", "critical", now());
        assert_eq!(incident.status(), Status::New);
        assert_eq!(incident.name(), "disk-full");
        assert_eq!(incident.severity(), "critical");
        assert_eq!(incident.alerts(), &[Alert::new("disk-full", "critical")]);
        assert_eq!(incident.starts_at(), now());
        assert!(incident.ends_at().is_none());
        assert!(incident.actions().is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "incident.created");
    }

    #[test]
    fn merge_appends_in_arrival_order() {
        let mut incident = make_incident();
        incident
            .merge_alert(Alert::new("cpu-high", "warning"), now())
            .unwrap();
        let events = incident
            .merge_alert(Alert::new("disk-full", "critical"), now())
            .unwrap();
        let names: Vec<_> = incident.alerts().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["disk-full", "cpu-high", "disk-full"]);
        assert_eq!(events[0].event_type(), "incident.alert_merged");
    }

    #[test]
    fn merge_never_changes_severity() {
        let (mut incident, _) = Incident::new("disk-full", "warning", now());
        incident
            .merge_alert(Alert::new("disk-full", "critical"), now())
            .unwrap();
        assert_eq!(incident.severity(), "warning");
    }

    #[test]
    fn merge_into_closed_fails() {
        let mut incident = make_incident();
        incident.close(later()).unwrap();
        let result = incident.merge_alert(Alert::new("disk-full", "critical"), now());
        assert_eq!(result, Err(DomainError::IncidentAlreadyClosed));
    }

    #[test]
    fn acknowledge_from_new_succeeds() {
        let mut incident = make_incident();
        let events = incident.acknowledge(now()).unwrap();
        assert_eq!(incident.status(), Status::Acknowledged);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "incident.acknowledged");
    }

    #[test]
    fn acknowledge_twice_is_noop() {
        let mut incident = make_incident();
        incident.acknowledge(now()).unwrap();
        let events = incident.acknowledge(now()).unwrap();
        assert!(events.is_empty());
        assert_eq!(incident.status(), Status::Acknowledged);
    }

    #[test]
    fn acknowledge_from_closed_fails() {
        let mut incident = make_incident();
        incident.close(later()).unwrap();
        assert_eq!(
            incident.acknowledge(now()),
            Err(DomainError::IncidentAlreadyClosed)
        );
    }

    #[test]
    fn close_from_new_sets_end_time() {
        let mut incident = make_incident();
        let events = incident.close(later()).unwrap();
        assert_eq!(incident.status(), Status::Closed);
        assert_eq!(incident.ends_at(), Some(later()));
        assert_eq!(events[0].event_type(), "incident.closed");
    }

    #[test]
    fn close_from_acknowledged_succeeds() {
        let mut incident = make_incident();
        incident.acknowledge(now()).unwrap();
        incident.close(later()).unwrap();
        assert_eq!(incident.status(), Status::Closed);
    }

    #[test]
    fn close_already_closed_is_noop() {
        let mut incident = make_incident();
        incident.close(later()).unwrap();
        let events = incident.close(now()).unwrap();
        assert!(events.is_empty());
        assert_eq!(incident.ends_at(), Some(later()));
    }

    #[test]
    fn actions_keep_dispatch_order() {
        let mut incident = make_incident();
        incident.record_action(Action::new(Channel::Telegram, "first", now()));
        incident.record_action(Action::new(Channel::Phone, "second", later()));
        let channels: Vec<_> = incident.actions().iter().map(|a| a.channel).collect();
        assert_eq!(channels, [Channel::Telegram, Channel::Phone]);
    }

    #[test]
    fn status_serializes_with_short_names() {
        let mut incident = make_incident();
        incident.acknowledge(now()).unwrap();
        let json = serde_json::to_value(&incident).unwrap();
        assert_eq!(json["status"], "ack");
        assert_eq!(json["alerts"][0]["name"], "disk-full");
    }
}
