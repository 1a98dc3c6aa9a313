use klaxon_core::error::DomainError;
use klaxon_ports::error::{IntakeError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("intake error: {0}")]
    Intake(#[from] IntakeError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
