use crate::config::Settings;
use crate::domain::contract::LlmRationale;
use crate::llm::error::RationaleError;
use crate::llm::json;
use crate::llm::{Provider, Rationale, RationaleGenerator, RationaleInput};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 512;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 2;
const MAX_RETRIES: u32 = 6;
const MAX_BACKOFF_SECS: u64 = 30;

const TOOL_NAME_EMIT_RATIONALE: &str = "emit_rationale";

#[derive(Debug, Clone)]
pub struct AnthropicRationaleClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    retries: u32,
}

impl AnthropicRationaleClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("ANTHROPIC_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .clamp(1, MAX_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
            retries,
        })
    }

    async fn create_message(
        &self,
        req: &CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(RationaleError {
                provider: Provider::Anthropic,
                stage: "http",
                status: Some(status.as_u16()),
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn tools() -> Vec<Tool> {
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["rationale", "key_factors", "warnings", "timeframe", "confidence"],
            "properties": {
                "rationale": {"type": "string"},
                "key_factors": {"type": "array", "maxItems": 5, "items": {"type": "string"}},
                "warnings": {"type": "array", "maxItems": 5, "items": {"type": "string"}},
                "timeframe": {"type": "string", "enum": ["short-term", "medium-term", "long-term"]},
                "confidence": {"type": "string", "enum": ["high", "medium", "low"]}
            }
        });

        vec![Tool {
            name: TOOL_NAME_EMIT_RATIONALE,
            description: "Emit the investment rationale as structured JSON",
            input_schema: schema,
        }]
    }

    fn tool_choice() -> ToolChoice {
        ToolChoice::Tool {
            name: TOOL_NAME_EMIT_RATIONALE,
        }
    }

    fn system_prompt() -> String {
        [
            "You explain investment recommendations produced by a fixed scoring model.",
            "Do not change the recommendation, risk level or score; explain them.",
            "Return ONLY valid JSON. Do not wrap in markdown. Do not include any extra keys.",
            "Output schema:",
            "{",
            "  \"rationale\": \"2-3 sentence explanation of the recommendation\",",
            "  \"key_factors\": [\"factor1\", \"factor2\", \"factor3\"],",
            "  \"warnings\": [\"warning1\", \"warning2\"],",
            "  \"timeframe\": \"short-term|medium-term|long-term\",",
            "  \"confidence\": \"high|medium|low\"",
            "}",
        ]
        .join("\n")
    }

    fn user_prompt(input: &RationaleInput) -> String {
        let rec = &input.recommendation;
        let labels = &input.labels;
        let financial = match labels.financial_health {
            Some(h) => label(&h),
            None => "not applicable".to_string(),
        };
        format!(
            "Based on the following analysis, provide a brief investment rationale (2-3 sentences):\n\n\
Company/Asset: {}\n\
Recommendation: {}\n\
Risk Level: {}\n\
Investment Score: {}\n\
Price Trend: {}\n\
Financial Health: {}\n\
Market Sentiment: {}",
            input.name,
            rec.recommendation_type,
            rec.risk_level,
            rec.investment_score,
            label(&labels.price_trend),
            financial,
            label(&labels.sentiment),
        )
    }

    fn request(&self, input: &RationaleInput) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(Self::system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::user_prompt(input),
            }],
            tools: Some(Self::tools()),
            tool_choice: Some(Self::tool_choice()),
        }
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    fn response_tool_rationale(res: &CreateMessageResponse) -> anyhow::Result<Option<LlmRationale>> {
        for block in &res.content {
            if let ContentBlock::ToolUse { name, input, .. } = block {
                if name == TOOL_NAME_EMIT_RATIONALE {
                    let parsed = serde_json::from_value::<LlmRationale>(input.clone())
                        .context("failed to decode tool_use.input into LlmRationale")?;
                    return Ok(Some(parsed));
                }
            }
        }
        Ok(None)
    }

    fn rationale_from_response(
        raw_json: serde_json::Value,
        res: &CreateMessageResponse,
    ) -> anyhow::Result<Rationale> {
        if let Some(tool_rationale) = Self::response_tool_rationale(res)? {
            return tool_rationale.validate_and_into_rationale();
        }

        // Fallback to text (should be rare with a forced tool choice).
        let text = Self::response_text(res);
        json::parse_rationale(&text).map_err(|err| {
            RationaleError {
                provider: Provider::Anthropic,
                stage: "parse",
                status: None,
                detail: format!("{err:#}"),
                raw_output: Some(text),
                raw_response_json: Some(raw_json),
            }
            .into()
        })
    }
}

fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Transport failures, 429 and 5xx are worth another attempt; other HTTP
/// errors and undecodable bodies are not.
fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(diag) = err.downcast_ref::<RationaleError>() {
        return matches!(diag.status, Some(s) if s == 429 || s >= 500);
    }
    err.chain().any(|cause| cause.is::<reqwest::Error>())
}

/// 1s, 2s, 4s, ... capped at `MAX_BACKOFF_SECS`.
fn backoff(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    Duration::from_secs((1u64 << exp).min(MAX_BACKOFF_SECS))
}

#[async_trait::async_trait]
impl RationaleGenerator for AnthropicRationaleClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate_rationale(&self, input: &RationaleInput) -> anyhow::Result<Rationale> {
        let req = self.request(input);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.create_message(&req).await {
                Ok((raw_json, res)) => return Self::rationale_from_response(raw_json, &res),
                Err(err) => {
                    if attempt >= self.retries || !is_transient(&err) {
                        return Err(err);
                    }
                    let delay = backoff(attempt);
                    tracing::warn!(
                        attempt,
                        backoff = ?delay,
                        subject = %input.name,
                        error = %err,
                        "Anthropic rationale request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}
