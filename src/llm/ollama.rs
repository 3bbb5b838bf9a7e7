use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{
    Generation, GenerationRequest, LlmClient, LlmClientError, OutputMode, build_http_client,
    map_error_status, map_send_error,
};

/// Client for the Ollama `/api/generate` endpoint.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    mode: OutputMode,
}

impl OllamaClient {
    /// Build a client targeting `base_url` with a fixed model and output mode.
    pub fn new(
        base_url: String,
        model: String,
        mode: OutputMode,
        timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url,
            model,
            mode,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
    #[serde(default)]
    model: Option<String>,
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, LlmClientError> {
        let mut payload = json!({
            "model": self.model,
            "system": request.system_prompt,
            "prompt": request.user_prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
            }
        });
        if let (OutputMode::Schema, Some(schema)) = (self.mode, request.response_schema) {
            payload["format"] = schema;
        }

        let endpoint = self.endpoint();
        tracing::debug!(
            model = %self.model,
            endpoint = %endpoint,
            "Sending Ollama generate request"
        );
        let response = self
            .http
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_send_error("Ollama", &self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status("Ollama", status, body));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(LlmClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(Generation {
            text: body.response.trim().to_string(),
            model: body.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(server: &MockServer, mode: OutputMode) -> OllamaClient {
        OllamaClient::new(
            server.base_url(),
            "llama3".into(),
            mode,
            Duration::from_secs(5),
        )
        .expect("client")
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: "Be brief.".into(),
            user_prompt: "Summarize the following text:\n\nhello".into(),
            response_schema: Some(json!({ "type": "object" })),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn schema_mode_sends_format_field() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{ "format": { "type": "object" }, "stream": false }"#);
                then.status(200).json_body(json!({
                    "response": " {\"summary\":\"hi\"} ",
                    "done": true
                }));
            })
            .await;

        let generation = client(&server, OutputMode::Schema)
            .generate(request())
            .await
            .expect("generation");

        mock.assert_async().await;
        assert_eq!(generation.text, "{\"summary\":\"hi\"}");
        assert_eq!(generation.model, "llama3");
    }

    #[tokio::test]
    async fn plain_mode_omits_schema() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate").json_body(json!({
                    "model": "llama3",
                    "system": "Be brief.",
                    "prompt": "Summarize the following text:\n\nhello",
                    "stream": false,
                    "options": { "temperature": 0.0 }
                }));
                then.status(200).json_body(json!({
                    "response": "Plain summary",
                    "done": true,
                    "model": "llama3:latest"
                }));
            })
            .await;

        let generation = client(&server, OutputMode::Plain)
            .generate(request())
            .await
            .expect("generation");

        mock.assert_async().await;
        assert_eq!(generation.text, "Plain summary");
        assert_eq!(generation.model, "llama3:latest");
    }

    #[tokio::test]
    async fn error_status_maps_to_generation_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client(&server, OutputMode::Schema)
            .generate(request())
            .await
            .expect_err("error response");

        assert!(matches!(
            error,
            LlmClientError::GenerationFailed(ref message) if message.contains("500")
        ));
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "partial", "done": false }));
            })
            .await;

        let error = client(&server, OutputMode::Plain)
            .generate(request())
            .await
            .expect_err("incomplete");

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }
}
