//! `QwenGateway` — [`TranslationGateway`] backed by a hosted Qwen model.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GatewayConfig;
use crate::prompt::{
    parse_steps, sql_to_steps_prompt, steps_to_sql_prompt, strip_sql_fences, text_to_sql_prompt,
    SQL_TO_STEPS_SYSTEM, STEPS_TO_SQL_SYSTEM, TEXT_TO_SQL_SYSTEM,
};
use crate::{Step, TranslationFailure, TranslationGateway};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    input: CompletionInput<'a>,
    parameters: CompletionParameters,
}

#[derive(Serialize)]
struct CompletionInput<'a> {
    messages: [Message<'a>; 2],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionParameters {
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    output: CompletionOutput,
}

#[derive(Deserialize)]
struct CompletionOutput {
    text: String,
}

// ---------------------------------------------------------------------------
// QwenGateway
// ---------------------------------------------------------------------------

/// HTTP client for the text-generation service.
///
/// ```no_run
/// use gateway::{GatewayConfig, QwenGateway, TranslationGateway};
///
/// # async fn example() -> Result<(), gateway::TranslationFailure> {
/// let gateway = QwenGateway::new(GatewayConfig::from_env())?;
/// let sql = gateway.text_to_sql("all users who signed up this week", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QwenGateway {
    config: GatewayConfig,
    http: HttpClient,
}

impl QwenGateway {
    /// Build a client for `config`.
    ///
    /// # Errors
    /// Returns [`TranslationFailure::InvalidConfig`] if the model URL is not
    /// HTTP(S), or [`TranslationFailure::Http`] if the client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, TranslationFailure> {
        if !config.model_url.starts_with("http://") && !config.model_url.starts_with("https://") {
            return Err(TranslationFailure::InvalidConfig(format!(
                "model URL must start with http:// or https://, got: {}",
                config.model_url
            )));
        }

        let http = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send one system + user exchange and return the trimmed reply text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, TranslationFailure> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranslationFailure::MissingCredential)?;

        let body = CompletionRequest {
            model: &self.config.model,
            input: CompletionInput {
                messages: [
                    Message { role: "system", content: system },
                    Message { role: "user", content: prompt },
                ],
            },
            parameters: CompletionParameters {
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
        };

        let response = self
            .http
            .post(&self.config.model_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let text = Self::handle_response(response).await?;
        debug!(chars = text.len(), "model replied");
        Ok(text)
    }

    async fn handle_response(response: Response) -> Result<String, TranslationFailure> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // DashScope reports `{"code": ..., "message": ...}`; fall back to
            // the raw body for anything else.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| {
                    json["message"]
                        .as_str()
                        .or_else(|| json["error"].as_str())
                        .map(str::to_owned)
                })
                .unwrap_or(body);

            return Err(TranslationFailure::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: CompletionResponse = serde_json::from_str(&body)?;
        Ok(reply.output.text.trim().to_owned())
    }
}

#[async_trait]
impl TranslationGateway for QwenGateway {
    #[instrument(skip(self, natural_language, schema), fields(has_schema = schema.is_some()))]
    async fn text_to_sql(
        &self,
        natural_language: &str,
        schema: Option<&str>,
    ) -> Result<String, TranslationFailure> {
        let prompt = text_to_sql_prompt(natural_language, schema);
        let reply = self.complete(TEXT_TO_SQL_SYSTEM, &prompt).await?;
        Ok(strip_sql_fences(&reply))
    }

    #[instrument(skip(self, sql))]
    async fn sql_to_steps(&self, sql: &str) -> Result<Vec<Step>, TranslationFailure> {
        let prompt = sql_to_steps_prompt(sql);
        let reply = self.complete(SQL_TO_STEPS_SYSTEM, &prompt).await?;
        parse_steps(&reply)
    }

    #[instrument(skip(self, steps), fields(steps = steps.len()))]
    async fn steps_to_sql(&self, steps: &[Step]) -> Result<String, TranslationFailure> {
        let prompt = steps_to_sql_prompt(steps)?;
        let reply = self.complete(STEPS_TO_SQL_SYSTEM, &prompt).await?;
        Ok(strip_sql_fences(&reply))
    }
}
