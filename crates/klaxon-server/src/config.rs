use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use klaxon_app::retry::RetryPolicy;
use klaxon_app::service::ServiceSettings;
use klaxon_core::phone::Phone;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3333";
const DEFAULT_ANNOUNCEMENT_URL: &str = "http://demo.twilio.com/docs/voice.xml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{key} is set but {missing} is missing")]
    Incomplete {
        key: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from: Phone,
    pub to: Phone,
    pub announcement_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub service: ServiceSettings,
    pub retry: RetryPolicy,
    pub telegram: Option<TelegramConfig>,
    pub twilio: Option<TwilioConfig>,
    pub callmebot_user: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = parse_or(&get, "KLAXON_LISTEN_ADDR", DEFAULT_LISTEN_ADDR.to_string())?;
        let queue_capacity = positive(&get, "KLAXON_QUEUE_CAPACITY", 3)?;
        let interval_secs = positive(&get, "KLAXON_NOTIFY_INTERVAL_SECS", 60)?;
        let max_attempts = positive(&get, "KLAXON_RETRY_ATTEMPTS", 3)?;
        let delay_secs: u64 = parse_or(&get, "KLAXON_RETRY_DELAY_SECS", "5".to_string())?;

        Ok(Self {
            listen_addr,
            service: ServiceSettings {
                queue_capacity: queue_capacity as usize,
                notify_interval: Duration::from_secs(interval_secs),
            },
            retry: RetryPolicy {
                max_attempts: max_attempts as u32,
                delay: Duration::from_secs(delay_secs),
            },
            telegram: telegram(&get)?,
            twilio: twilio(&get)?,
            callmebot_user: get("CALLMEBOT_USER"),
        })
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: String) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = get(key).unwrap_or(default);
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("{raw:?}: {e}"),
    })
}

fn positive<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value: u64 = parse_or(get, key, default.to_string())?;
    if value == 0 || value > u64::from(u32::MAX) {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be between 1 and {}", u32::MAX),
        });
    }
    Ok(value)
}

fn phone<G>(get: &G, key: &'static str) -> Result<Phone, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).unwrap_or_default();
    Phone::new(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn telegram<G>(get: &G) -> Result<Option<TelegramConfig>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match (get("TG_BOT_TOKEN"), get("TG_CHAT_ID")) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Incomplete {
            key: "TG_BOT_TOKEN",
            missing: "TG_CHAT_ID",
        }),
        (None, Some(_)) => Err(ConfigError::Incomplete {
            key: "TG_CHAT_ID",
            missing: "TG_BOT_TOKEN",
        }),
        (Some(bot_token), Some(_)) => Ok(Some(TelegramConfig {
            bot_token,
            chat_id: parse_or(get, "TG_CHAT_ID", String::new())?,
        })),
    }
}

fn twilio<G>(get: &G) -> Result<Option<TwilioConfig>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    const KEYS: [&str; 4] = [
        "TWILIO_ACCOUNT_SID",
        "TWILIO_AUTH_TOKEN",
        "TWILIO_FROM",
        "TWILIO_TO",
    ];
    let present: Vec<&'static str> = KEYS.into_iter().filter(|k| get(k).is_some()).collect();
    if present.is_empty() {
        return Ok(None);
    }
    if let Some(missing) = KEYS.into_iter().find(|k| !present.contains(k)) {
        return Err(ConfigError::Incomplete {
            key: present[0],
            missing,
        });
    }

    Ok(Some(TwilioConfig {
        account_sid: get("TWILIO_ACCOUNT_SID").unwrap_or_default(),
        auth_token: get("TWILIO_AUTH_TOKEN").unwrap_or_default(),
        from: phone(get, "TWILIO_FROM")?,
        to: phone(get, "TWILIO_TO")?,
        announcement_url: get("TWILIO_ANNOUNCEMENT_URL")
            .unwrap_or_else(|| DEFAULT_ANNOUNCEMENT_URL.to_string()),
    }))
}
