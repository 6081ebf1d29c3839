use crate::error::ConfigError;
use std::fmt;
use zeroize::Zeroizing;

/// Messaging provider credentials and the fixed sender/recipient pair.
///
/// Only ever read from the environment; never written to `config.toml`.
#[derive(Clone)]
pub struct Credentials {
    pub account_sid: String,
    pub auth_token: Zeroizing<String>,
    pub from_number: String,
    pub to_number: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            account_sid: required(&["COUPONWATCH_ACCOUNT_SID", "TWILIO_ACCOUNT_SID"])?,
            auth_token: Zeroizing::new(required(&[
                "COUPONWATCH_AUTH_TOKEN",
                "TWILIO_AUTH_TOKEN",
            ])?),
            from_number: normalize_number(&required(&["COUPONWATCH_FROM_NUMBER"])?),
            to_number: normalize_number(&required(&["COUPONWATCH_TO_NUMBER"])?),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("to_number", &self.to_number)
            .finish()
    }
}

/// First non-empty value among `keys`; the error names the preferred key.
fn required(keys: &[&'static str]) -> Result<String, ConfigError> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(keys[0].to_string()))
}

/// E.164 with a leading `+`; a `whatsapp:` prefix is stripped.
pub(crate) fn normalize_number(raw: &str) -> String {
    let number = raw.trim();
    let number = number.strip_prefix("whatsapp:").unwrap_or(number).trim();
    if number.starts_with('+') {
        number.to_string()
    } else {
        format!("+{number}")
    }
}
