use async_trait::async_trait;

use klaxon_core::alert::Alert;
use klaxon_core::error::DomainError;
use klaxon_core::ids::IncidentId;

use crate::error::IntakeError;
use crate::types::RegistrySnapshot;

pub trait AlertReceiver: Send + Sync {
    /// Never blocks: a full queue sheds the alert.
    fn submit_alert(&self, alert: Alert) -> Result<(), IntakeError>;
}

#[async_trait]
pub trait IncidentManager: Send + Sync {
    async fn acknowledge(&self, incident_id: IncidentId) -> Result<(), DomainError>;
    async fn close(&self, incident_id: IncidentId) -> Result<(), DomainError>;
    async fn current_state(&self) -> RegistrySnapshot;
}
