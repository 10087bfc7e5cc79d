use serde::Deserialize;

/// Top-level webhook payload. The provider batches events per page entry;
/// anything that is not a plain text message is ignored upstream.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    #[serde(default)]
    pub message: Option<MessageContent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<String>,
}

/// One inbound text message, flattened out of the webhook batch shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

/// Flattens a webhook payload into the text messages it carries. Non-page
/// objects, non-message events, and empty texts are dropped silently.
pub fn inbound_messages(payload: &WebhookPayload) -> Vec<InboundMessage> {
    if payload.object != "page" {
        return Vec::new();
    }

    payload
        .entry
        .iter()
        .flat_map(|entry| entry.messaging.iter())
        .filter_map(|event| {
            let text = event.message.as_ref()?.text.as_deref()?.trim();
            if text.is_empty() {
                return None;
            }
            Some(InboundMessage { sender_id: event.sender.id.clone(), text: text.to_string() })
        })
        .collect()
}

/// GET /webhook handshake: on `hub.mode=subscribe` with the matching verify
/// token, the provider expects the challenge echoed back; anything else is
/// rejected by the caller.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    if mode != Some("subscribe") {
        return None;
    }
    if token != Some(expected_token) {
        return None;
    }
    challenge.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{inbound_messages, verify_subscription, InboundMessage, WebhookPayload};

    fn payload(raw: &str) -> WebhookPayload {
        serde_json::from_str(raw).expect("payload should parse")
    }

    #[test]
    fn flattens_batched_text_messages() {
        let payload = payload(
            r#"{
                "object": "page",
                "entry": [
                    {"messaging": [
                        {"sender": {"id": "5215550001"}, "message": {"text": "hola"}},
                        {"sender": {"id": "5215550002"}, "message": {"text": "busco un auto"}}
                    ]},
                    {"messaging": [
                        {"sender": {"id": "5215550003"}, "message": {"text": "  "}}
                    ]}
                ]
            }"#,
        );

        let messages = inbound_messages(&payload);
        assert_eq!(
            messages,
            vec![
                InboundMessage { sender_id: "5215550001".to_string(), text: "hola".to_string() },
                InboundMessage {
                    sender_id: "5215550002".to_string(),
                    text: "busco un auto".to_string()
                },
            ]
        );
    }

    #[test]
    fn non_page_objects_and_non_message_events_are_ignored() {
        let other = payload(r#"{"object": "user", "entry": []}"#);
        assert!(inbound_messages(&other).is_empty());

        let delivery_receipt = payload(
            r#"{
                "object": "page",
                "entry": [{"messaging": [{"sender": {"id": "x"}}]}]
            }"#,
        );
        assert!(inbound_messages(&delivery_receipt).is_empty());
    }

    #[test]
    fn subscription_verification_echoes_the_challenge_only_on_a_token_match() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("secret"), Some("1234"), "secret"),
            Some("1234".to_string())
        );
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("wrong"), Some("1234"), "secret"),
            None
        );
        assert_eq!(verify_subscription(None, Some("secret"), Some("1234"), "secret"), None);
        assert_eq!(verify_subscription(Some("subscribe"), Some("secret"), None, "secret"), None);
    }
}
