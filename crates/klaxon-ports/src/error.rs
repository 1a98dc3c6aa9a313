use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response status: {0}")]
    Status(u16),
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<NotifyError>,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("alert queue is full")]
    QueueFull,
    #[error("alert queue is closed")]
    Closed,
}
