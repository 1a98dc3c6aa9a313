use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use klaxon_core::channel::{Channel, Target};
use klaxon_core::phone::Phone;
use klaxon_ports::error::NotifyError;
use klaxon_ports::outbound::Notifier;
use klaxon_ports::types::{Notification, NotifyResult};

use super::{check_status, transport_error};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_ANNOUNCEMENT_URL: &str = "http://demo.twilio.com/docs/voice.xml";

/// Places an outbound call that plays a fixed TwiML announcement.
///
/// The notification text is not spoken; the call itself is the page.
pub struct TwilioVoiceNotifier {
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: Phone,
    announcement_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct CallResource {
    sid: Option<String>,
}

impl TwilioVoiceNotifier {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>, from: Phone) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from,
            announcement_url: DEFAULT_ANNOUNCEMENT_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_announcement_url(mut self, url: impl Into<String>) -> Self {
        self.announcement_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioVoiceNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let Target::Phone(to) = &notification.target else {
            return Err(NotifyError::InvalidTarget(format!(
                "voice call needs a phone number, got {}",
                notification.target
            )));
        };

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", self.from.as_str()),
                ("Url", self.announcement_url.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&response)?;

        let call: Option<CallResource> = response.json().await.ok();
        let sid = call.and_then(|c| c.sid);
        debug!(to = %to, sid = ?sid, "voice call placed");
        Ok(NotifyResult { external_id: sid })
    }

    fn channel(&self) -> Channel {
        Channel::Phone
    }
}
