use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use klaxon_core::channel::Channel;
use klaxon_ports::error::NotifyError;
use klaxon_ports::outbound::Notifier;
use klaxon_ports::types::{Notification, NotifyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Retries every failure of the inner notifier with a fixed delay.
pub struct RetryNotifier<N: Notifier> {
    inner: N,
    policy: RetryPolicy,
}

impl<N: Notifier> RetryNotifier<N> {
    pub fn new(inner: N, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for RetryNotifier<N> {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.notify(notification).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt >= attempts => {
                    return Err(NotifyError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(
                        channel = self.inner.channel().as_str(),
                        incident_id = %notification.incident_id,
                        attempt,
                        error = %e,
                        "notification attempt failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn channel(&self) -> Channel {
        self.inner.channel()
    }
}
