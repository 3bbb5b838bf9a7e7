use std::sync::Arc;
use std::time::Instant;

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EvaluationError, current_timestamp_rfc3339, require_text};
use crate::llm::{GenerationRequest, LlmClient, OutputMode};
use crate::processing::{PromptRecord, summarize::strip_code_fence};

/// Instructions for the fact-checking model.
pub const HALLUCINATION_SYSTEM_PROMPT: &str = "You are a fact-checking system.

Your task:
- Compare the RESPONSE against the GROUND TRUTH.
- Identify any statements in the RESPONSE that are NOT supported by the GROUND TRUTH.
- Do NOT infer or assume facts.
- If all information is supported, return has_hallucination = false.

Return ONLY valid JSON.";

/// Verdict the model must return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HallucinationVerdict {
    /// Whether the response states anything the reference does not support.
    pub has_hallucination: bool,
    /// Unsupported statements quoted from the response.
    pub hallucinated_statements: Vec<String>,
    /// Short reasoning for the verdict.
    pub explanation: String,
}

/// Call details recorded alongside a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallucinationCheckMetadata {
    /// Model that produced the verdict.
    pub model_name: String,
    /// RFC 3339 UTC timestamp.
    pub checked_at: String,
    /// Wall-clock seconds spent in the LLM call.
    pub processing_time: f64,
}

/// Result of [`HallucinationChecker::check`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallucinationCheck {
    /// Validated verdict.
    pub result: HallucinationVerdict,
    /// Prompts sent to the model.
    pub prompt: PromptRecord,
    /// Call details.
    pub metadata: HallucinationCheckMetadata,
}

/// Asks the LLM which statements of a response its reference text does not support.
pub struct HallucinationChecker {
    client: Arc<dyn LlmClient>,
    response_schema: Value,
}

impl HallucinationChecker {
    /// Checker over the given client.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        let response_schema = serde_json::to_value(schema_for!(HallucinationVerdict))
            .unwrap_or_else(|_| Value::Object(Default::default()));
        Self {
            client,
            response_schema,
        }
    }

    /// Check `response` against `ground_truth`.
    ///
    /// The reply must decode into a [`HallucinationVerdict`] in both output modes; the schema
    /// is only attached to the request in [`OutputMode::Schema`]. A verdict that flags a
    /// hallucination without naming any statement is rejected.
    pub async fn check(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<HallucinationCheck, EvaluationError> {
        require_text("ground_truth", ground_truth)?;
        require_text("response", response)?;

        let mode = self.client.output_mode();
        let user_prompt = render_user_prompt(ground_truth, response);
        let request = GenerationRequest {
            system_prompt: HALLUCINATION_SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt.clone(),
            response_schema: match mode {
                OutputMode::Schema => Some(self.response_schema.clone()),
                OutputMode::Plain => None,
            },
            temperature: 0.0,
        };

        tracing::debug!(?mode, "Checking response for hallucinations");
        let started = Instant::now();
        let generation = self.client.generate(request).await?;
        let processing_time = started.elapsed().as_secs_f64();

        let verdict = parse_verdict(&generation.text)?;
        tracing::info!(
            has_hallucination = verdict.has_hallucination,
            statements = verdict.hallucinated_statements.len(),
            model = %generation.model,
            "Hallucination check completed"
        );

        Ok(HallucinationCheck {
            result: verdict,
            prompt: PromptRecord {
                system_prompt: HALLUCINATION_SYSTEM_PROMPT.to_string(),
                user_prompt,
            },
            metadata: HallucinationCheckMetadata {
                model_name: generation.model,
                checked_at: current_timestamp_rfc3339(),
                processing_time,
            },
        })
    }
}

fn render_user_prompt(ground_truth: &str, response: &str) -> String {
    format!(
        "GROUND TRUTH:\n{ground_truth}\n\nRESPONSE:\n{response}\n\n\
         Return JSON in the following format:\n\
         {{\n  \"has_hallucination\": true | false,\n  \"hallucinated_statements\": [\"...\"],\n  \
         \"explanation\": \"...\"\n}}"
    )
}

fn parse_verdict(raw: &str) -> Result<HallucinationVerdict, EvaluationError> {
    let verdict: HallucinationVerdict =
        serde_json::from_str(strip_code_fence(raw)).map_err(|error| {
            tracing::error!(%error, "Hallucination verdict validation failed");
            EvaluationError::SchemaValidationFailed(error.to_string())
        })?;
    if verdict.has_hallucination && verdict.hallucinated_statements.is_empty() {
        return Err(EvaluationError::SchemaValidationFailed(
            "has_hallucination is true but no statements were listed".into(),
        ));
    }
    Ok(verdict)
}
