use async_trait::async_trait;
use reqwest::Client;

use klaxon_core::channel::{Channel, Target};
use klaxon_ports::error::NotifyError;
use klaxon_ports::outbound::Notifier;
use klaxon_ports::types::{Notification, NotifyResult};

use super::{check_status, transport_error};

pub const DEFAULT_API_BASE: &str = "http://api.callmebot.com";

/// Rings a Telegram user via CallMeBot and reads the message aloud.
pub struct CallMeBotNotifier {
    api_base: String,
    client: Client,
}

impl CallMeBotNotifier {
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl Default for CallMeBotNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for CallMeBotNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let Target::Handle(user) = &notification.target else {
            return Err(NotifyError::InvalidTarget(format!(
                "callmebot needs a telegram handle, got {}",
                notification.target
            )));
        };

        let response = self
            .client
            .get(format!("{}/start.php", self.api_base.trim_end_matches('/')))
            .query(&[
                ("source", "klaxon"),
                ("user", user.as_str()),
                ("text", notification.message.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&response)?;

        Ok(NotifyResult::default())
    }

    fn channel(&self) -> Channel {
        Channel::TelegramCall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaxon_core::ids::IncidentId;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification(target: Target) -> Notification {
        Notification {
            incident_id: IncidentId::new(),
            message: "New Incident".into(),
            target,
        }
    }

    #[tokio::test]
    async fn starts_call_for_handle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start.php"))
            .and(query_param("user", "@oncall"))
            .and(query_param("text", "New Incident"))
            .and(query_param("source", "klaxon"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = CallMeBotNotifier::new().with_api_base(server.uri());
        notifier
            .notify(&notification(Target::Handle("@oncall".into())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = CallMeBotNotifier::new().with_api_base(server.uri());
        let err = notifier
            .notify(&notification(Target::Handle("@oncall".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Status(500)));
    }

    #[test]
    fn reports_its_channel() {
        assert_eq!(CallMeBotNotifier::new().channel(), Channel::TelegramCall);
    }
}
