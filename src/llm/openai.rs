use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{
    Generation, GenerationRequest, LlmClient, LlmClientError, OutputMode, build_http_client,
    map_error_status, map_send_error,
};

/// Client for OpenAI-compatible `/v1/chat/completions` endpoints.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    mode: OutputMode,
}

impl OpenAiClient {
    /// Build a client targeting `base_url` with a fixed model and output mode.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        mode: OutputMode,
        timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url,
            api_key,
            model,
            mode,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
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
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
        });
        if let (OutputMode::Schema, Some(schema)) = (self.mode, request.response_schema) {
            payload["response_format"] = json!({
                "type": "json_schema",
                "json_schema": { "name": "response", "schema": schema },
            });
        }

        let endpoint = self.endpoint();
        tracing::debug!(
            model = %self.model,
            endpoint = %endpoint,
            "Sending chat completion request"
        );
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_send_error("OpenAI", &self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status("OpenAI", status, body));
        }

        let body: ChatCompletion = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode chat completion: {error}"))
        })?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmClientError::InvalidResponse("chat completion contained no content".into())
            })?;

        Ok(Generation {
            text: text.trim().to_string(),
            model: body.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            server.base_url(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
            OutputMode::Schema,
            Duration::from_secs(5),
        )
        .expect("client")
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: "Be brief.".into(),
            user_prompt: "Summarize".into(),
            response_schema: Some(json!({ "type": "object" })),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(
                        r#"{ "response_format": { "type": "json_schema" } }"#,
                    );
                then.status(200).json_body(json!({
                    "model": "gpt-4o-mini-2024-07-18",
                    "choices": [
                        { "message": { "role": "assistant", "content": "{\"summary\":\"ok\"}" } }
                    ]
                }));
            })
            .await;

        let generation = client(&server).generate(request()).await.expect("generation");

        mock.assert_async().await;
        assert_eq!(generation.text, "{\"summary\":\"ok\"}");
        assert_eq!(generation.model, "gpt-4o-mini-2024-07-18");
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(429).body("quota exceeded");
            })
            .await;

        let error = client(&server)
            .generate(request())
            .await
            .expect_err("rate limited");

        assert!(matches!(error, LlmClientError::RateLimited(_)));
    }

    #[tokio::test]
    async fn empty_choices_are_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client(&server)
            .generate(request())
            .await
            .expect_err("no content");

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }
}
