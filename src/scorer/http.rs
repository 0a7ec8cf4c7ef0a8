//! Chat-completions backend over HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::adapter::{Scorer, ScoringRequest};
use super::error::ScorerError;
use super::pricing::PricingTable;
use super::schema::{JUDGMENT_SYSTEM_INSTRUCTION, parse_envelope, parse_judgment_content};
use crate::model::{CommitteeMember, Judgment};

/// Default cap on completion tokens per judgment.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2_000;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// [`Scorer`] for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct HttpScorer {
    provider: String,
    base_url: String,
    api_key: Option<String>,
    max_output_tokens: u32,
    pricing: Arc<PricingTable>,
    client: reqwest::Client,
}

impl HttpScorer {
    pub fn new(provider: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            provider: provider.into(),
            base_url: base_url.into(),
            api_key: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            pricing: Arc::new(PricingTable::default()),
            client,
        }
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn pricing(mut self, pricing: Arc<PricingTable>) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// JSON-mode chat request: system instruction, then the rendered prompt.
    fn build_request(
        &self,
        member: &CommitteeMember,
        prompt: &str,
    ) -> Result<CreateChatCompletionRequest, ScorerError> {
        let build_failed = |e: &dyn std::fmt::Display| {
            self.unreachable(format!("failed to build request: {}", e))
        };

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(JUDGMENT_SYSTEM_INSTRUCTION)
            .build()
            .map_err(|e| build_failed(&e))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| build_failed(&e))?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(member.model.as_str())
            .messages([
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ])
            .temperature(member.temperature)
            .max_tokens(self.max_output_tokens)
            .response_format(ResponseFormat::JsonObject);
        if let Some(seed) = member.seed.and_then(|seed| i64::try_from(seed).ok()) {
            args.seed(seed);
        }
        args.build().map_err(|e| build_failed(&e))
    }

    fn unreachable(&self, message: impl Into<String>) -> ScorerError {
        ScorerError::BackendUnreachable {
            provider: self.provider.clone(),
            message: message.into(),
        }
    }
}

impl std::fmt::Debug for HttpScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpScorer")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    #[instrument(skip(self, request), fields(provider = %self.provider, model = %request.member.model))]
    async fn score(&self, request: ScoringRequest<'_>) -> Result<Judgment, ScorerError> {
        let started = Instant::now();
        let member = request.member;

        let body = self.build_request(member, request.prompt)?;

        let mut http_request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                self.unreachable(format!("request timed out: {}", e))
            } else {
                self.unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.unreachable(format!("failed reading response body: {}", e)))?;

        if !status.is_success() {
            return Err(ScorerError::BackendRejected {
                provider: self.provider.clone(),
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        let (content, usage) = parse_envelope(&bytes, &member.model)?;
        let payload = parse_judgment_content(&content, &member.model)?;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        let cost_usd = self.pricing.estimate(&member.model, usage.as_ref());
        debug!(processing_time_ms, cost_usd, "judgment received");

        Ok(payload.into_judgment(&member.model, &self.provider, processing_time_ms, cost_usd))
    }
}

/// Prefers `{"error": {"message": ...}}`, falling back to the raw body.
fn error_message(body: &[u8]) -> String {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).to_string());
    truncate(message, MAX_ERROR_MESSAGE_LEN)
}

fn truncate(mut message: String, max: usize) -> String {
    if message.len() > max {
        let mut cut = max;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}
