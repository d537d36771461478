use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BackendError, ChatBackend};

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// reqwest client for the `/chat` and `/reset` endpoints
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Transport(format!("request timeout after {:?}", self.timeout))
        } else {
            BackendError::from(err)
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, query: &str) -> Result<String, BackendError> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(%url, "sending chat request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .json(&ChatRequest { query })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(status = %response.status(), "chat request failed");
            return Err(BackendError::BadStatus(response.status()));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(chat_response.response)
    }

    async fn reset(&self) -> Result<(), BackendError> {
        let url = format!("{}/reset", self.base_url);
        tracing::debug!(%url, "sending reset request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(status = %response.status(), "reset request failed");
            return Err(BackendError::BadStatus(response.status()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&format!("{}/api", server.uri()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_trailing_slash_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reset"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&format!("{}/api/", server.uri()), Duration::from_secs(5));
        assert!(backend.reset().await.is_ok());
    }

    #[tokio::test]
    async fn test_chat_sends_query_and_reads_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "query": "hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hello" })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend(&server).chat("hi").await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_chat_non_200_is_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = backend(&server).chat("hi").await.unwrap_err();
        assert_eq!(err, BackendError::BadStatus(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_chat_other_success_status_is_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "response": "hello" })))
            .mount(&server)
            .await;

        let err = backend(&server).chat("hi").await.unwrap_err();
        assert_eq!(err, BackendError::BadStatus(StatusCode::CREATED));
    }

    #[tokio::test]
    async fn test_chat_malformed_body_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "hello" })))
            .mount(&server)
            .await;

        let err = backend(&server).chat("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_chat_timeout_reports_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&format!("{}/api", server.uri()), Duration::from_millis(200));
        let err = backend.chat("hi").await.unwrap_err();
        match err {
            BackendError::Transport(detail) => assert!(detail.contains("timeout"), "{detail}"),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_connection_refused_is_transport() {
        // Nothing listens on port 9 of localhost in the test environment
        let backend = HttpBackend::new("http://127.0.0.1:9/api", Duration::from_secs(2));
        let err = backend.chat("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_reset_success_and_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reset"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/reset"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let backend = backend(&server);
        assert!(backend.reset().await.is_ok());
        assert_eq!(
            backend.reset().await.unwrap_err(),
            BackendError::BadStatus(StatusCode::SERVICE_UNAVAILABLE)
        );
    }
}
