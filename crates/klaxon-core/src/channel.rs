use serde::{Deserialize, Serialize};

use crate::phone::Phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Telegram,
    Phone,
    TelegramCall,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Phone => "phone",
            Self::TelegramCall => "telegram_call",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a channel delivers: a chat id, a phone number or a messenger handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    Chat(i64),
    Phone(Phone),
    Handle(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "chat:{id}"),
            Self::Phone(phone) => write!(f, "phone:{phone}"),
            Self::Handle(handle) => write!(f, "handle:{handle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_serializes_as_snake_case() {
        let json = serde_json::to_string(&Channel::TelegramCall).unwrap();
        assert_eq!(json, "\"telegram_call\"");
        assert_eq!(Channel::TelegramCall.as_str(), "telegram_call");
    }

    #[test]
    fn target_display_names_the_kind() {
        assert_eq!(Target::Chat(-984782066).to_string(), "chat:-984782066");
        let phone = Phone::new("+79251893906").unwrap();
        assert_eq!(Target::Phone(phone).to_string(), "phone:+79251893906");
        assert_eq!(
            Target::Handle("@oncall".into()).to_string(),
            "handle:@oncall"
        );
    }
}
