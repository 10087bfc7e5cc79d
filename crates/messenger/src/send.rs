use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("send api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("send api rejected the message: status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Outbound message delivery. The server keeps one implementation per
/// process: the real Send API client, or the noop transport in preview mode
/// and tests.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), SendError>;
}

/// Logs instead of delivering. This is the transport while messenger
/// delivery is disabled in config.
#[derive(Default)]
pub struct NoopSender;

#[async_trait]
impl MessageSender for NoopSender {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), SendError> {
        debug!(
            event_name = "egress.noop_send",
            recipient_id = %recipient_id,
            chars = text.chars().count(),
            "noop transport dropped outbound message"
        );
        Ok(())
    }
}

/// Graph-style Send API client: `POST {base}/me/messages` with the page
/// access token as a query parameter.
pub struct SendApiClient {
    http: reqwest::Client,
    api_base_url: String,
    page_access_token: SecretString,
}

impl SendApiClient {
    pub fn new(api_base_url: impl Into<String>, page_access_token: SecretString) -> Self {
        Self { http: reqwest::Client::new(), api_base_url: api_base_url.into(), page_access_token }
    }
}

#[async_trait]
impl MessageSender for SendApiClient {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), SendError> {
        let url = format!("{}/me/messages", self.api_base_url.trim_end_matches('/'));
        let payload = json!({
            "recipient": {"id": recipient_id},
            "message": {"text": text},
        });

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.page_access_token.expose_secret())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "egress.send_rejected",
                recipient_id = %recipient_id,
                status = status.as_u16(),
                "send api rejected outbound message"
            );
            return Err(SendError::Api { status: status.as_u16(), body });
        }

        debug!(
            event_name = "egress.send_delivered",
            recipient_id = %recipient_id,
            "outbound message delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageSender, NoopSender, SendApiClient};
    use secrecy::SecretString;

    #[tokio::test]
    async fn noop_sender_always_succeeds() {
        let sender = NoopSender;
        sender.send_text("5215550001", "hola").await.expect("noop send");
    }

    #[tokio::test]
    async fn send_api_client_surfaces_transport_failures() {
        // Nothing listens here; the client must return an error instead of
        // panicking or hanging.
        let sender =
            SendApiClient::new("http://127.0.0.1:9", SecretString::from("token".to_string()));
        let result = sender.send_text("5215550001", "hola").await;
        assert!(result.is_err());
    }
}
