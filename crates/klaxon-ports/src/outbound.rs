use async_trait::async_trait;

use klaxon_core::alert::Alert;
use klaxon_core::channel::Channel;

use crate::error::{NotifyError, ParseError};
use crate::types::{Notification, NotifyResult};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError>;
    fn channel(&self) -> Channel;
}

pub trait AlertSourceParser: Send + Sync {
    fn parse(&self, payload: &[u8]) -> Result<Vec<Alert>, ParseError>;
    fn source_name(&self) -> &str;
}
