use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::WhatsAppConfig;

use super::{MessagingTransport, SendReceipt, TransportError};

/// WhatsApp Cloud API client. Holds one pooled `reqwest::Client`; clones share it.
#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    messages_url: Url,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

impl WhatsAppClient {
    pub fn new(http: reqwest::Client, config: &WhatsAppConfig) -> Result<Self, TransportError> {
        if config.phone_number_id.is_empty() {
            return Err(TransportError::NotConfigured("WHATSAPP_PHONE_NUMBER_ID"));
        }
        if config.access_token.is_empty() {
            return Err(TransportError::NotConfigured("WHATSAPP_ACCESS_TOKEN"));
        }

        let mut messages_url = Url::parse(&config.api_base_url)
            .map_err(|_| TransportError::NotConfigured("WHATSAPP_API_BASE_URL"))?;
        messages_url
            .path_segments_mut()
            .map_err(|_| TransportError::NotConfigured("WHATSAPP_API_BASE_URL"))?
            .pop_if_empty()
            .extend([config.api_version.as_str(), config.phone_number_id.as_str(), "messages"]);

        Ok(Self {
            http,
            messages_url,
            access_token: config.access_token.clone(),
        })
    }

    pub fn messages_url(&self) -> &Url {
        &self.messages_url
    }
}

#[async_trait]
impl MessagingTransport for WhatsAppClient {
    async fn send(&self, to: &str, text: &str) -> Result<SendReceipt, TransportError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": text }
        });

        let response = self
            .http
            .post(self.messages_url.clone())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| SendReceipt { message_id: m.id })
            .ok_or_else(|| TransportError::MalformedResponse("no message id in response".to_string()))
    }
}
