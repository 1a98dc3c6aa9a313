use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use klaxon_core::channel::{Channel, Target};
use klaxon_ports::error::NotifyError;
use klaxon_ports::outbound::Notifier;
use klaxon_ports::types::{Notification, NotifyResult};

use super::{check_status, transport_error};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Posts the incident text to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    client: Client,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    result: Option<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let Target::Chat(chat_id) = notification.target else {
            return Err(NotifyError::InvalidTarget(format!(
                "telegram needs a chat id, got {}",
                notification.target
            )));
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&SendMessage {
                chat_id,
                text: &notification.message,
            })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&response)?;
        debug!(chat_id, status = %response.status(), "telegram accepted message");

        let body: Option<SendMessageResponse> = response.json().await.ok();
        Ok(NotifyResult {
            external_id: body
                .and_then(|b| b.result)
                .map(|m| m.message_id.to_string()),
        })
    }

    fn channel(&self) -> Channel {
        Channel::Telegram
    }
}
