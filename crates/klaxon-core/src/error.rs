use thiserror::Error;

use crate::ids::IncidentId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("no active incident")]
    NoActiveIncident,
    #[error("active incident is {active}, request was for {requested}")]
    IdMismatch {
        active: IncidentId,
        requested: IncidentId,
    },
    #[error("incident {0} is already active")]
    IncidentAlreadyActive(IncidentId),
    #[error("incident is already closed")]
    IncidentAlreadyClosed,
    #[error("unknown incident: {0}")]
    UnknownIncident(IncidentId),
    #[error("invalid phone format")]
    InvalidPhoneFormat,
    #[error("invalid id: {0}")]
    InvalidId(String),
}
