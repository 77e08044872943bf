//! HTTP client for the generateRoutine proxy

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::types::GenerateRequest;
use crate::error::BackendError;

/// Worker-first routine generation endpoint
#[async_trait]
pub trait RoutineBackend: Send + Sync {
    /// Returns the proxy's JSON body as-is, whatever its HTTP status
    async fn generate(&self, request: &GenerateRequest) -> Result<Value, BackendError>;
}

/// Client for communicating with the proxy server
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generateRoutine", self.base_url)
    }
}

#[async_trait]
impl RoutineBackend for BackendClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Value, BackendError> {
        let url = self.endpoint();
        tracing::debug!("POST {} ({} products)", url, request.products.len());
        self.client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    /// Serve `router` on an ephemeral local port and return its base url
    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = BackendClient::new(Client::new(), "http://127.0.0.1:8787/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8787/generateRoutine");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // nothing listens on port 9 locally
        let client = BackendClient::new(Client::new(), "http://127.0.0.1:9");
        let result = client.generate(&GenerateRequest::default()).await;
        assert!(matches!(result, Err(BackendError::Transport(_))));
    }

    #[tokio::test]
    async fn test_error_status_body_is_passed_through() {
        let router = Router::new().route(
            "/generateRoutine",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "boom" })),
                )
            }),
        );
        let client = BackendClient::new(Client::new(), &spawn(router).await);

        let body = client.generate(&GenerateRequest::default()).await.unwrap();
        assert_eq!(body["error"], "boom");
    }

    #[tokio::test]
    async fn test_success_body_is_returned() {
        let router = Router::new().route(
            "/generateRoutine",
            post(|Json(request): Json<GenerateRequest>| async move {
                Json(json!({ "routine": format!("{} products", request.products.len()), "raw": {} }))
            }),
        );
        let client = BackendClient::new(Client::new(), &spawn(router).await);

        let body = client.generate(&GenerateRequest::default()).await.unwrap();
        assert_eq!(body["routine"], "0 products");
    }
}
