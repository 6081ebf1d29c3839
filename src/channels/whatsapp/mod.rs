use super::traits::Channel;
use crate::config::Credentials;
use crate::error::NotifierError;
use async_trait::async_trait;
use std::time::Duration;
use zeroize::Zeroizing;

const API_VERSION: &str = "2010-04-01";
const MAX_BODY_CHARS: usize = 1600;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `WhatsApp` channel: sends through a Twilio-compatible Messages API
///
/// Every message goes out from the configured sender number; the recipient is
/// chosen per call. Numbers are E.164 and get the `whatsapp:` address prefix
/// on the wire.
pub struct WhatsAppChannel {
    api_base_url: String,
    account_sid: String,
    auth_token: Zeroizing<String>,
    from_number: String,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(api_base_url: &str, credentials: &Credentials) -> Self {
        crate::tls::install_crypto_provider();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("WhatsApp: falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            account_sid: credentials.account_sid.clone(),
            auth_token: credentials.auth_token.clone(),
            from_number: credentials.from_number.clone(),
            client,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }

    fn account_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}.json",
            self.api_base_url, self.account_sid
        )
    }

    /// `whatsapp:+15550001111` address form for a bare E.164 number
    fn address(number: &str) -> String {
        let number = number.trim();
        if number.starts_with("whatsapp:") {
            number.to_string()
        } else if number.starts_with('+') {
            format!("whatsapp:{number}")
        } else {
            format!("whatsapp:+{number}")
        }
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn max_message_length(&self) -> usize {
        MAX_BODY_CHARS
    }

    async fn send(&self, message: &str, recipient: &str) -> Result<(), NotifierError> {
        let form = [
            ("From", Self::address(&self.from_number)),
            ("To", Self::address(recipient)),
            ("Body", message.to_string()),
        ];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.as_str()))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifierError::Network {
                channel: self.name().to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let error_body = resp.text().await.unwrap_or_default();
        tracing::error!("WhatsApp send failed: {status}: {error_body}");

        if matches!(status.as_u16(), 401 | 403) {
            return Err(NotifierError::Auth {
                channel: self.name().to_string(),
                status: status.as_u16(),
            });
        }
        Err(NotifierError::Api {
            channel: self.name().to_string(),
            status: status.as_u16(),
            body: error_body,
        })
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.account_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.as_str()))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
