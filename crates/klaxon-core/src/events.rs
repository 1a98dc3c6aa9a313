use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ids::IncidentId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEvent {
    IncidentCreated(IncidentCreated),
    AlertMerged(AlertMerged),
    IncidentAcknowledged(IncidentAcknowledged),
    IncidentClosed(IncidentClosed),
}

impl DomainEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::IncidentCreated(e) => e.occurred_at,
            Self::AlertMerged(e) => e.occurred_at,
            Self::IncidentAcknowledged(e) => e.occurred_at,
            Self::IncidentClosed(e) => e.occurred_at,
        }
    }

    pub fn incident_id(&self) -> IncidentId {
        match self {
            Self::IncidentCreated(e) => e.incident_id,
            Self::AlertMerged(e) => e.incident_id,
            Self::IncidentAcknowledged(e) => e.incident_id,
            Self::IncidentClosed(e) => e.incident_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IncidentCreated(_) => "incident.created",
            Self::AlertMerged(_) => "incident.alert_merged",
            Self::IncidentAcknowledged(_) => "incident.acknowledged",
            Self::IncidentClosed(_) => "incident.closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentCreated {
    pub incident_id: IncidentId,
    pub name: String,
    pub severity: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMerged {
    pub incident_id: IncidentId,
    pub alert_name: String,
    pub alert_count: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentAcknowledged {
    pub incident_id: IncidentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentClosed {
    pub incident_id: IncidentId,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn event_types_are_unique_strings() {
        let id = IncidentId::new();
        let events = [
            DomainEvent::IncidentCreated(IncidentCreated {
                incident_id: id,
                name: "disk-full".into(),
                severity: "critical".into(),
                occurred_at: now(),
            }),
            DomainEvent::AlertMerged(AlertMerged {
                incident_id: id,
                alert_name: "disk-full".into(),
                alert_count: 2,
                occurred_at: now(),
            }),
            DomainEvent::IncidentAcknowledged(IncidentAcknowledged {
                incident_id: id,
                occurred_at: now(),
            }),
            DomainEvent::IncidentClosed(IncidentClosed {
                incident_id: id,
                occurred_at: now(),
            }),
        ];
        let mut unique = std::collections::HashSet::new();
        for event in &events {
            assert!(
                unique.insert(event.event_type()),
                "duplicate event type: {}",
                event.event_type()
            );
            assert_eq!(event.incident_id(), id);
            assert_eq!(event.occurred_at(), now());
        }
    }
}
