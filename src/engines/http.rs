//! Hosted inference endpoint transport.
//!
//! Endpoint: POST <url>
//! Body: `{"inputs": "<text>", "parameters": {...}}`
//! Auth: optional Bearer token

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::Transport;

/// Transport that posts text to an HTTP inference endpoint
pub struct HttpTransport {
    url: String,
    token: Option<String>,
    parameters: serde_json::Value,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "is_null")]
    parameters: &'a serde_json::Value,
}

fn is_null(value: &&serde_json::Value) -> bool {
    value.is_null()
}

impl HttpTransport {
    /// Create a new transport
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        parameters: serde_json::Value,
        call_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url: url.into(),
            token,
            parameters,
            client,
        })
    }

    /// Create a transport reading its bearer token from `token_env`, if set
    pub fn from_env(
        url: impl Into<String>,
        token_env: Option<&str>,
        parameters: serde_json::Value,
        call_timeout: Duration,
    ) -> Result<Self> {
        let token = token_env
            .and_then(|name| std::env::var(name).ok())
            .filter(|t| !t.trim().is_empty());
        Self::new(url, token, parameters, call_timeout)
    }

    fn request_body<'a>(&'a self, text: &'a str) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: text,
            parameters: &self.parameters,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn call(&self, text: &str) -> Result<serde_json::Value> {
        let mut request = self.client.post(&self.url).json(&self.request_body(text));
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach inference endpoint {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference endpoint error ({}): {}", status, body.trim());
        }

        let value: serde_json::Value = response
            .json()
            .await
            .context("Inference endpoint returned invalid JSON")?;

        debug!(url = %self.url, "Inference endpoint answered");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Whether a buffered HTTP/1 request has all of its headers and body
    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= split + 4 + length
    }

    /// Answer one request with `status` and `body`; yields the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/models/camembert-ner", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request_complete(&request) {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn test_request_body() {
        let transport = HttpTransport::new(
            "http://localhost:1/models/camembert-ner",
            None,
            serde_json::json!({"aggregation_strategy": "simple"}),
            Duration::from_secs(1),
        )
        .unwrap();

        let body = serde_json::to_value(transport.request_body("Paris")).unwrap();
        assert_eq!(body["inputs"], "Paris");
        assert_eq!(body["parameters"]["aggregation_strategy"], "simple");
    }

    #[test]
    fn test_null_parameters_omitted() {
        let transport = HttpTransport::new(
            "http://localhost:1/ner",
            None,
            serde_json::Value::Null,
            Duration::from_secs(1),
        )
        .unwrap();

        let body = serde_json::to_value(transport.request_body("Paris")).unwrap();
        assert!(body.get("parameters").is_none());
    }

    #[test]
    fn test_token_from_env() {
        std::env::set_var("NERLENS_TEST_HTTP_TOKEN", "secret");
        let transport = HttpTransport::from_env(
            "http://localhost:1/ner",
            Some("NERLENS_TEST_HTTP_TOKEN"),
            serde_json::Value::Null,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(transport.token.as_deref(), Some("secret"));

        let transport = HttpTransport::from_env(
            "http://localhost:1/ner",
            Some("NERLENS_TEST_HTTP_TOKEN_UNSET"),
            serde_json::Value::Null,
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(transport.token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let transport = HttpTransport::new(
            "http://127.0.0.1:1/ner",
            None,
            serde_json::Value::Null,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = transport.call("Paris").await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach inference endpoint"));
    }

    #[tokio::test]
    async fn test_error_status_carries_body_and_token() {
        let (url, server) =
            serve_once("503 Service Unavailable", r#"{"error":"Model is currently loading"}"#).await;
        let transport = HttpTransport::new(
            url,
            Some("hf_test_token".to_string()),
            serde_json::json!({"aggregation_strategy": "simple"}),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = transport.call("Paris").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"), "{}", message);
        assert!(message.contains(r#"{"error":"Model is currently loading"}"#), "{}", message);

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /models/camembert-ner"), "{}", request);
        assert!(lowered.contains("authorization: bearer hf_test_token"), "{}", request);
        assert!(request.contains(r#""inputs":"Paris""#), "{}", request);
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"entity_group":"LOC","score":0.99,"word":"Paris","start":0,"end":5}]"#,
        )
        .await;
        let transport =
            HttpTransport::new(url, None, serde_json::Value::Null, Duration::from_secs(5)).unwrap();

        let value = transport.call("Paris").await.unwrap();
        assert_eq!(value[0]["entity_group"], "LOC");

        let request = server.await.unwrap();
        assert!(!request.to_lowercase().contains("authorization:"), "{}", request);
    }
}
