use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// A notification that was confirmed delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub channel: Channel,
    pub time: DateTime<Utc>,
    pub message: String,
}

impl Action {
    pub fn new(channel: Channel, message: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            channel,
            time,
            message: message.into(),
        }
    }
}
