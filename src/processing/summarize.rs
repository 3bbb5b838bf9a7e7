//! Single-text summarization backed by an injected LLM client.

use std::sync::Arc;
use std::time::Instant;

use crate::llm::{GenerationRequest, LlmClient, OutputMode};
use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::types::{ChunkSummary, ChunkSummaryMetadata, PromptRecord, SummarizeTextError};

/// Default instructions for the summarization model.
pub const SYSTEM_SUMMARIZATION_PROMPT: &str = "You are a professional document summarization assistant.

Rules:
- Produce an accurate, concise, and faithful summary.
- Do NOT introduce information not present in the text.
- Preserve key facts, entities, and conclusions.
- Avoid unnecessary verbosity.
- Write in clear, neutral language.";

const SUMMARY_TEMPERATURE: f32 = 0.0;

/// Capability consumed by the PDF pipeline: summarize one chunk of text.
#[async_trait]
pub trait ChunkSummarizer: Send + Sync {
    /// Summarize `text`, returning the summary and call measurements.
    async fn summarize_chunk(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError>;
}

/// Reply shape requested from schema-capable providers.
#[derive(Debug, Deserialize, JsonSchema)]
struct SummaryPayload {
    /// Faithful summary of the supplied text.
    summary: String,
    /// ISO 639-1 code of the language the text is written in.
    document_language: String,
}

/// Summarizes text with a fixed system prompt.
pub struct TextSummarizer {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    response_schema: Value,
}

impl TextSummarizer {
    /// Build a summarizer using [`SYSTEM_SUMMARIZATION_PROMPT`].
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_system_prompt(client, SYSTEM_SUMMARIZATION_PROMPT)
    }

    /// Build a summarizer with custom instructions.
    pub fn with_system_prompt(
        client: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let response_schema = serde_json::to_value(schema_for!(SummaryPayload))
            .unwrap_or_else(|_| Value::Object(Default::default()));
        Self {
            client,
            system_prompt: system_prompt.into(),
            response_schema,
        }
    }

    /// Summarize `text`.
    ///
    /// In [`OutputMode::Schema`] the reply must decode into `{ summary, document_language }`;
    /// anything else is a [`SummarizeTextError::SchemaValidationFailed`]. In
    /// [`OutputMode::Plain`] the trimmed reply is the summary and no language is reported.
    pub async fn summarize(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError> {
        if text.trim().is_empty() {
            tracing::error!("Cannot summarize: text is empty");
            return Err(SummarizeTextError::EmptyText);
        }

        let mode = self.client.output_mode();
        let user_prompt = format!("Summarize the following text:\n\n{text}");
        let request = GenerationRequest {
            system_prompt: self.system_prompt.clone(),
            user_prompt: user_prompt.clone(),
            response_schema: match mode {
                OutputMode::Schema => Some(self.response_schema.clone()),
                OutputMode::Plain => None,
            },
            temperature: SUMMARY_TEMPERATURE,
        };

        tracing::debug!(chars = text.len(), ?mode, "Generating summary");
        let started = Instant::now();
        let generation = self.client.generate(request).await?;
        let processing_time = started.elapsed().as_secs_f64();

        let (summary, document_language) = match mode {
            OutputMode::Schema => {
                let payload = parse_summary_payload(&generation.text)?;
                (payload.summary.trim().to_string(), Some(payload.document_language))
            }
            OutputMode::Plain => (generation.text.trim().to_string(), None),
        };
        if summary.is_empty() {
            return Err(SummarizeTextError::SchemaValidationFailed(
                "summary must not be empty".into(),
            ));
        }

        tracing::info!(
            summary_chars = summary.len(),
            model = %generation.model,
            "Summary generated"
        );

        Ok(ChunkSummary {
            metadata: ChunkSummaryMetadata {
                model_name: generation.model,
                document_language: document_language.filter(|lang| !lang.trim().is_empty()),
                document_length: text.chars().count(),
                summary_length: summary.chars().count(),
                processing_time,
            },
            summary,
            prompt: PromptRecord {
                system_prompt: self.system_prompt.clone(),
                user_prompt,
            },
        })
    }
}

#[async_trait]
impl ChunkSummarizer for TextSummarizer {
    async fn summarize_chunk(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError> {
        self.summarize(text).await
    }
}

fn parse_summary_payload(raw: &str) -> Result<SummaryPayload, SummarizeTextError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|error| {
        tracing::error!(%error, "Summary output validation failed");
        SummarizeTextError::SchemaValidationFailed(error.to_string())
    })
}

/// Remove a surrounding Markdown code fence, which some models emit even in JSON mode.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Generation, LlmClientError};
    use std::sync::Mutex;

    struct ScriptedClient {
        mode: OutputMode,
        reply: Result<String, String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedClient {
        fn new(mode: OutputMode, reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                mode,
                reply: reply.map(str::to_string).map_err(str::to_string),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn model_name(&self) -> &str {
            "scripted"
        }

        fn output_mode(&self) -> OutputMode {
            self.mode
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<Generation, LlmClientError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(Generation {
                    text: text.clone(),
                    model: "scripted".into(),
                }),
                Err(message) => Err(LlmClientError::GenerationFailed(message.clone())),
            }
        }
    }

    #[tokio::test]
    async fn schema_mode_decodes_structured_reply() {
        let client = ScriptedClient::new(
            OutputMode::Schema,
            Ok(r#"{"summary":"  Cats sleep a lot. ","document_language":"en"}"#),
        );
        let summarizer = TextSummarizer::new(client.clone());

        let result = summarizer
            .summarize("Cats sleep up to sixteen hours a day.")
            .await
            .expect("summary");

        assert_eq!(result.summary, "Cats sleep a lot.");
        assert_eq!(result.metadata.document_language.as_deref(), Some("en"));
        assert_eq!(result.metadata.document_length, 37);
        assert_eq!(result.metadata.summary_length, 17);
        assert_eq!(result.metadata.model_name, "scripted");
        assert!(result.prompt.user_prompt.starts_with("Summarize the following text:\n\n"));

        let requests = client.requests.lock().unwrap();
        let schema = requests[0].response_schema.as_ref().expect("schema sent");
        assert_eq!(schema["required"], serde_json::json!(["document_language", "summary"]));
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn plain_mode_uses_reply_text() {
        let client = ScriptedClient::new(OutputMode::Plain, Ok("  A short summary.\n"));
        let summarizer = TextSummarizer::new(client.clone());

        let result = summarizer.summarize("Some long text").await.expect("summary");

        assert_eq!(result.summary, "A short summary.");
        assert!(result.metadata.document_language.is_none());
        assert!(client.requests.lock().unwrap()[0].response_schema.is_none());
    }

    #[tokio::test]
    async fn malformed_structured_reply_fails_validation() {
        let client = ScriptedClient::new(OutputMode::Schema, Ok(r#"{"text":"wrong shape"}"#));
        let summarizer = TextSummarizer::new(client);

        let error = summarizer.summarize("Some text").await.unwrap_err();

        assert!(matches!(error, SummarizeTextError::SchemaValidationFailed(_)));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_calling_provider() {
        let client = ScriptedClient::new(OutputMode::Plain, Ok("unused"));
        let summarizer = TextSummarizer::new(client.clone());

        let error = summarizer.summarize("   ").await.unwrap_err();

        assert!(matches!(error, SummarizeTextError::EmptyText));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let client = ScriptedClient::new(OutputMode::Plain, Err("overloaded"));
        let summarizer = TextSummarizer::new(client);

        let error = summarizer.summarize("Some text").await.unwrap_err();

        assert!(matches!(
            error,
            SummarizeTextError::Llm(LlmClientError::GenerationFailed(_))
        ));
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
