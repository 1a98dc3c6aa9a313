use serde::Serialize;

use klaxon_core::channel::Target;
use klaxon_core::ids::IncidentId;
use klaxon_core::incident::Incident;

/// Message ready to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct Notification {
    pub incident_id: IncidentId,
    pub message: String,
    pub target: Target,
}

/// Delivery metadata returned by notifiers.
#[derive(Debug, Clone, Default)]
pub struct NotifyResult {
    pub external_id: Option<String>,
}

/// Read-only view of the registry for rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrySnapshot {
    pub active: Option<Incident>,
    pub history: Vec<Incident>,
}
