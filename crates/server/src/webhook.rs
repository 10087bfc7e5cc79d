use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

use forecourt_agent::runtime::AgentRuntime;
use forecourt_messenger::events::{self, WebhookPayload};
use forecourt_messenger::send::MessageSender;

#[derive(Clone)]
pub struct WebhookState {
    pub runtime: Arc<AgentRuntime>,
    pub sender: Arc<dyn MessageSender>,
    pub verify_token: SecretString,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

async fn home() -> &'static str {
    "forecourt está funcionando 🚗"
}

/// Provider handshake: echo the challenge only when the verify token
/// matches.
async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let challenge = events::verify_subscription(
        params.get("hub.mode").map(String::as_str),
        params.get("hub.verify_token").map(String::as_str),
        params.get("hub.challenge").map(String::as_str),
        state.verify_token.expose_secret(),
    );

    match challenge {
        Some(challenge) => {
            info!(event_name = "ingress.webhook_verified", "webhook subscription verified");
            (StatusCode::OK, challenge)
        }
        None => {
            warn!(
                event_name = "ingress.webhook_verification_rejected",
                "webhook verification failed; token mismatch or malformed request"
            );
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
    }
}

/// Inbound message batch. Every message is answered; a delivery failure is
/// logged and the rest of the batch continues, so the provider always gets
/// a 200 and does not re-deliver.
async fn receive(
    State(state): State<WebhookState>,
    Json(payload): Json<WebhookPayload>,
) -> StatusCode {
    for message in events::inbound_messages(&payload) {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "ingress.message_received",
            correlation_id = %correlation_id,
            customer_id = %message.sender_id,
            chars = message.text.chars().count(),
            "received inbound message"
        );

        let reply = state.runtime.handle_message(&message.sender_id, &message.text).await;

        if let Err(error) = state.sender.send_text(&message.sender_id, &reply).await {
            warn!(
                event_name = "egress.delivery_failed",
                correlation_id = %correlation_id,
                customer_id = %message.sender_id,
                error = %error,
                "failed to deliver reply; continuing batch"
            );
        }
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use secrecy::SecretString;

    use forecourt_agent::runtime::AgentRuntime;
    use forecourt_core::{CatalogEngine, Dataset, KeywordKnowledgeBase, SessionStore};
    use forecourt_messenger::send::NoopSender;

    use super::{receive, verify, WebhookState};

    fn state() -> WebhookState {
        let engine = Arc::new(CatalogEngine::new(Dataset::default()));
        let sessions = Arc::new(SessionStore::new());
        WebhookState {
            runtime: Arc::new(AgentRuntime::with_defaults(
                engine,
                sessions,
                Arc::new(KeywordKnowledgeBase),
            )),
            sender: Arc::new(NoopSender),
            verify_token: SecretString::from("secret".to_string()),
        }
    }

    fn query(entries: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[tokio::test]
    async fn verification_echoes_the_challenge_for_a_matching_token() {
        let (status, body) = verify(
            State(state()),
            query(&[
                ("hub.mode", "subscribe"),
                ("hub.verify_token", "secret"),
                ("hub.challenge", "12345"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "12345");
    }

    #[tokio::test]
    async fn verification_rejects_a_wrong_token() {
        let (status, _) = verify(
            State(state()),
            query(&[
                ("hub.mode", "subscribe"),
                ("hub.verify_token", "intruso"),
                ("hub.challenge", "12345"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn inbound_batches_always_return_ok() {
        let payload = serde_json::from_str(
            r#"{
                "object": "page",
                "entry": [{"messaging": [
                    {"sender": {"id": "5215550001"}, "message": {"text": "busco un auto"}}
                ]}]
            }"#,
        )
        .expect("payload should parse");

        let status = receive(State(state()), Json(payload)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
