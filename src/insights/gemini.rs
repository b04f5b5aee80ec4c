//! Gemini `generateContent` REST client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::TextGenerationService;
use crate::error::{PipelineError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerationService for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Service(format!(
                "Gemini returned {}: {}",
                status,
                detail.chars().take(300).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        debug!("Gemini returned {} candidates", parsed.candidates.len());
        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PipelineError::Service(format!("prompt blocked: {}", reason)));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(PipelineError::Service("response contained no text".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    fn parse(json: &str) -> Result<String> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_joins_candidate_parts() {
        let text = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "Ringkasan "}, {"text": "Ulasan"}], "role": "model"}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(text, "Ringkasan Ulasan");
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let err = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidates_is_error() {
        assert!(parse(r#"{"candidates": []}"#).is_err());
        assert!(parse(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#).is_err());
    }

    #[test]
    fn test_endpoint_format() {
        let client = GeminiClient::new("k", "gemini-1.5-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    type SeenRequests = Arc<Mutex<Vec<(String, String, serde_json::Value)>>>;

    /// Fake `generateContent`: the model name picks the behaviour.
    async fn generate_content(
        State(seen): State<SeenRequests>,
        Path(target): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.lock().unwrap().push((key, target.clone(), body));

        match target.as_str() {
            "good-model:generateContent" => Json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Ringkasan Ulasan\nEnak."}]}}]
            }))
            .into_response(),
            "busy-model:generateContent" => {
                (StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response()
            }
            _ => "upstream proxy error page".into_response(),
        }
    }

    async fn gemini_server(seen: SeenRequests) -> String {
        let app = Router::new()
            .route("/v1beta/models/:target", post(generate_content))
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(model: &str, base: &str) -> GeminiClient {
        GeminiClient::new("test-key", model, Duration::from_secs(5))
            .unwrap()
            .with_base_url(base)
    }

    #[tokio::test]
    async fn test_generate_round_trip() {
        let seen = SeenRequests::default();
        let base = gemini_server(seen.clone()).await;

        let text = client("good-model", &base).generate("Analisis ulasan").await.unwrap();
        assert_eq!(text, "Ringkasan Ulasan\nEnak.");

        let requests = seen.lock().unwrap();
        let (key, target, body) = &requests[0];
        assert_eq!(key, "test-key");
        assert_eq!(target, "good-model:generateContent");
        assert_eq!(
            body,
            &serde_json::json!({"contents": [{"parts": [{"text": "Analisis ulasan"}]}]})
        );
    }

    #[tokio::test]
    async fn test_error_status_is_service_error() {
        let base = gemini_server(SeenRequests::default()).await;
        let err = client("busy-model", &base).generate("x").await.unwrap_err();
        assert!(matches!(err, PipelineError::Service(ref msg) if msg.contains("429")));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_service_error() {
        let base = gemini_server(SeenRequests::default()).await;
        let err = client("broken-model", &base).generate("x").await.unwrap_err();
        assert!(matches!(err, PipelineError::Service(_)));
    }
}
