//! generateRoutine proxy server
//!
//! Forwards a product selection to the chat-completion API with a
//! server-held credential. Anything other than `POST /generateRoutine`
//! is a 404.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::backend::completions::{ChatCompletion, CompletionClient};
use crate::backend::extract;
use crate::backend::types::{pretty, ChatMessage, GenerateRequest};
use crate::config::{self, Settings};

pub const SERVER_SYSTEM_PROMPT: &str = "You are a helpful beauty assistant. Given selected products and optional web citations, create a clear Morning and Evening routine in Markdown. Prioritize safety and label any uncertainty.";

/// Shared state for the proxy handlers
#[derive(Clone)]
pub struct ProxyState {
    completions: Arc<dyn ChatCompletion>,
    api_key: Option<String>,
}

impl ProxyState {
    pub fn new(completions: Arc<dyn ChatCompletion>, api_key: Option<String>) -> Self {
        Self {
            completions,
            api_key,
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            "/generateRoutine",
            post(generate_routine).fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub fn routine_messages(request: &GenerateRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SERVER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Selected products:\n{}\n\nCitations:\n{}",
            pretty(&request.products),
            pretty(&request.citations)
        )),
    ]
}

async fn generate_routine(State(state): State<ProxyState>, body: Bytes) -> Response {
    match forward(&state, &body).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(message) => {
            error!("generateRoutine failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response()
        }
    }
}

async fn forward(state: &ProxyState, body: &[u8]) -> Result<Value, String> {
    let request: GenerateRequest = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let api_key = state
        .api_key
        .as_deref()
        .ok_or_else(|| format!("{} is not configured on the server", config::CREDENTIAL_ENV))?;

    info!(
        "generateRoutine: {} products, {} citations",
        request.products.len(),
        request.citations.len()
    );
    let raw = state
        .completions
        .complete(api_key, &routine_messages(&request))
        .await
        .map_err(|e| e.to_string())?;
    let routine = extract::completion_choice(&raw).map(str::to_string);
    Ok(json!({ "routine": routine, "raw": raw }))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Run the proxy until the process is stopped
pub async fn run(settings: &Settings, bind: &str) -> std::io::Result<()> {
    let completions = Arc::new(CompletionClient::from_settings(
        settings.http_client(),
        settings,
    ));
    let api_key = config::credential();
    if api_key.is_none() {
        tracing::warn!(
            "{} not set; every generateRoutine call will fail",
            config::CREDENTIAL_ENV
        );
    }

    let app = router(ProxyState::new(completions, api_key));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FallbackError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct ScriptedCompletion {
        reply: Result<Value, FallbackError>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatCompletion for ScriptedCompletion {
        async fn complete(&self, api_key: &str, messages: &[ChatMessage]) -> Result<Value, FallbackError> {
            assert_eq!(api_key, "sk-server");
            self.prompts
                .lock()
                .unwrap()
                .push(messages[1].content.clone());
            self.reply.clone()
        }
    }

    fn app(reply: Result<Value, FallbackError>, key: Option<&str>) -> (Router, Arc<ScriptedCompletion>) {
        let completion = Arc::new(ScriptedCompletion {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let router = router(ProxyState::new(completion.clone(), key.map(str::to_string)));
        (router, completion)
    }

    async fn call(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_generate_returns_routine_and_raw() {
        let (router, completion) = app(
            Ok(json!({"choices": [{"message": {"content": "## Morning"}}]})),
            Some("sk-server"),
        );
        let body = r#"{"products": [{"name": "Serum", "brand": "B", "category": "skincare", "description": "d"}],
                       "citations": [{"title": "t", "url": "https://example.com", "snippet": "s"}]}"#;

        let (status, text) = call(router, "POST", "/generateRoutine", body).await;
        assert_eq!(status, StatusCode::OK);
        let reply: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reply["routine"], "## Morning");
        assert!(reply["raw"]["choices"].is_array());

        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Selected products:\n"));
        assert!(prompts[0].contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let (router, completion) = app(Ok(json!({"choices": []})), Some("sk-server"));
        let (status, text) = call(router, "POST", "/generateRoutine", "{}").await;
        assert_eq!(status, StatusCode::OK);
        let reply: Value = serde_json::from_str(&text).unwrap();
        assert!(reply["routine"].is_null());
        assert!(completion.prompts.lock().unwrap()[0].contains("Citations:\n[]"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error_body() {
        let (router, _) = app(Err(FallbackError::Transport("upstream down".into())), Some("sk-server"));
        let (status, text) = call(router, "POST", "/generateRoutine", "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let reply: Value = serde_json::from_str(&text).unwrap();
        assert!(reply["error"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_bad_json_and_missing_key_are_errors() {
        let (router, _) = app(Ok(json!({})), Some("sk-server"));
        let (status, _) = call(router, "POST", "/generateRoutine", "not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (router, completion) = app(Ok(json!({})), None);
        let (status, text) = call(router, "POST", "/generateRoutine", "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text.contains("OPENAI_API_KEY"));
        assert!(completion.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_routes_are_not_found() {
        for (method, uri) in [("GET", "/generateRoutine"), ("POST", "/other"), ("GET", "/")] {
            let (router, _) = app(Ok(json!({})), Some("sk-server"));
            let (status, text) = call(router, method, uri, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(text, "Not found");
        }
    }
}
