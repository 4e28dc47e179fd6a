//! WhatsApp webhook endpoints
//!
//! `GET /webhook` answers Meta's verification handshake, `POST /webhook`
//! receives message events and replies through the bot.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::schemas::whatsapp::{VerifyQuery, WebhookPayload};
use crate::server::state::AppState;

/// Body returned for every accepted notification
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Webhook verification handshake
///
/// Succeeds iff `hub.verify_token` equals the configured token; echoes
/// `hub.challenge` (or `OK` when Meta sent none) as plain text.
///
/// GET /webhook
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let token = query.verify_token.as_deref().unwrap_or_default();

    if !state.verify_token_matches(token) {
        tracing::warn!(mode = ?query.mode, "Webhook verification rejected");
        return Err(ApiError::Forbidden("Invalid verify token".to_string()));
    }

    tracing::info!(mode = ?query.mode, "Webhook verified");

    let challenge = query.challenge.unwrap_or_else(|| "OK".to_string());
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        challenge,
    ))
}

/// Inbound message events
///
/// Any well-formed JSON is acknowledged with `{"ok": true}`, whatever its
/// shape or content type; only bytes that are not JSON at all and a failure
/// to deliver the reply are reported back as errors.
///
/// POST /webhook
pub async fn receive(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AckResponse>, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("Body is not valid JSON: {}", e)))?;

    let payload: WebhookPayload = match serde_json::from_value(value) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Notification with an unexpected shape, acknowledging");
            return Ok(Json(AckResponse { ok: true }));
        }
    };

    let Some(message) = payload.first_message() else {
        tracing::debug!(object = ?payload.object, "Notification without messages");
        return Ok(Json(AckResponse { ok: true }));
    };

    let outcome = state.bot.handle_message(message).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to send WhatsApp reply");
        ApiError::Upstream(e.to_string())
    })?;

    tracing::info!(outcome = ?outcome, message_id = ?message.id, "Message handled");

    Ok(Json(AckResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::server::{routes::create_router, state::AppState};
    use crate::services::bot::testing::{FakeLlm, FakeReply, FakeSender};
    use crate::services::bot::{BotService, HELP_REPLY, TEXT_ONLY_REPLY};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(reply: FakeReply, sender: Arc<FakeSender>) -> (Router, Arc<FakeLlm>) {
        let llm = FakeLlm::new(reply);
        let bot = BotService::new(llm.clone(), sender, "be brief", 10);
        let state = AppState::with_bot(Settings::for_tests(), bot);
        (create_router(state), llm)
    }

    fn text_event(from: &str, body: &str) -> Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{"id": "WABA", "changes": [{"field": "messages", "value": {
                "messaging_product": "whatsapp",
                "messages": [{"from": from, "id": "wamid.1", "type": "text", "text": {"body": body}}]
            }}]}]
        })
    }

    fn post(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_verify_echoes_challenge() {
        let (app, _) = app(FakeReply::Empty, Arc::default());
        let response = app
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1158201444");
    }

    #[tokio::test]
    async fn test_verify_without_challenge_returns_ok() {
        let (app, _) = app(FakeReply::Empty, Arc::default());
        let response = app
            .oneshot(
                Request::get("/webhook?hub.verify_token=verify-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_or_missing_token() {
        for uri in [
            "/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1",
            "/webhook?hub.challenge=1",
        ] {
            let (app, _) = app(FakeReply::Empty, Arc::default());
            let response = app
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_text_message_round_trip() {
        let sender = Arc::new(FakeSender::default());
        let (app, llm) = app(FakeReply::Text("Resposta do modelo"), sender.clone());

        let response = app
            .oneshot(post(text_event("5511999999999", "Qual a capital do Brasil?").to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"ok": true}));

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls[0].last().unwrap().content, "Qual a capital do Brasil?");
        assert_eq!(
            *sender.sent.lock().unwrap(),
            vec![("5511999999999".to_string(), "Resposta do modelo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_help_command_over_http() {
        let sender = Arc::new(FakeSender::default());
        let (app, llm) = app(FakeReply::Text("unused"), sender.clone());

        let response = app.oneshot(post(text_event("5511", "/help").to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.sent.lock().unwrap()[0].1, HELP_REPLY);
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_text_message_over_http() {
        let sender = Arc::new(FakeSender::default());
        let (app, _) = app(FakeReply::Text("unused"), sender.clone());
        let event = json!({"entry": [{"changes": [{"value": {
            "messages": [{"from": "5511", "type": "sticker", "sticker": {"id": "s1"}}]
        }}]}]});

        let response = app.oneshot(post(event.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.sent.lock().unwrap()[0].1, TEXT_ONLY_REPLY);
    }

    #[tokio::test]
    async fn test_status_callback_acknowledged_without_reply() {
        let sender = Arc::new(FakeSender::default());
        let (app, llm) = app(FakeReply::Text("unused"), sender.clone());
        let event = json!({"entry": [{"changes": [{"value": {
            "statuses": [{"id": "wamid.1", "status": "read"}]
        }}]}]});

        let response = app.oneshot(post(event.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sender.sent.lock().unwrap().is_empty());
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_entry_acknowledged() {
        let (app, _) = app(FakeReply::Empty, Arc::default());
        let response = app.oneshot(post(json!({"entry": []}).to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_null_fields_acknowledged() {
        for event in [
            json!({"entry": null}),
            json!({"entry": [{"changes": [{"value": {"messages": null}}]}]}),
            json!({"entry": [{"changes": null}]}),
            json!({"entry": [{"changes": [{"value": null}]}]}),
        ] {
            let sender = Arc::new(FakeSender::default());
            let (app, _) = app(FakeReply::Text("unused"), sender.clone());

            let response = app.oneshot(post(event.to_string())).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{event}");
            let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body, json!({"ok": true}));
            assert!(sender.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unexpected_types_acknowledged() {
        for event in [json!({"entry": "oops"}), json!([1, 2, 3]), json!(null)] {
            let (app, _) = app(FakeReply::Empty, Arc::default());
            let response = app.oneshot(post(event.to_string())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{event}");
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_still_handled() {
        let sender = Arc::new(FakeSender::default());
        let (app, _) = app(FakeReply::Text("unused"), sender.clone());
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from(text_event("5511", "/help").to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.sent.lock().unwrap()[0].1, HELP_REPLY);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let (app, _) = app(FakeReply::Empty, Arc::default());
        let response = app.oneshot(post("{not json".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_failure_is_bad_gateway() {
        let sender = Arc::new(FakeSender {
            fail: true,
            ..Default::default()
        });
        let (app, _) = app(FakeReply::Text("ok"), sender);

        let response = app.oneshot(post(text_event("5511", "hi").to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
