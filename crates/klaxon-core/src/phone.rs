use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Voice call destination in E.164 format (e.g. "+41791234567").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    pub fn new(number: &str) -> Result<Self, DomainError> {
        if !Self::is_valid_e164(number) {
            return Err(DomainError::InvalidPhoneFormat);
        }
        Ok(Self(number.to_string()))
    }

    fn is_valid_e164(number: &str) -> bool {
        match number.strip_prefix('+') {
            Some(digits) => {
                (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
