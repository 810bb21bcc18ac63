//! The decision oracle consulted by guided navigation.
//!
//! The oracle only reads: it is given the goal, the steps taken so far and the
//! visible controls, and answers with the next action or a terminal status.

use crate::config::OracleConfig;
use crate::errors::AutomationError;
use crate::snapshot::ControlSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct DecisionRequest {
    pub goal: String,
    pub steps_completed: Vec<String>,
    pub window_title: String,
    /// Already filtered: nothing already acted on is listed.
    pub available_controls: Vec<ControlSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiActionType {
    Click,
    Toggle,
    SetValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Act {
        element_name: String,
        action_type: UiActionType,
        value: Option<Value>,
        reasoning: Option<String>,
    },
    Complete {
        reasoning: Option<String>,
    },
    NotFound {
        reasoning: Option<String>,
    },
}

#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision, AutomationError>;
}

#[derive(Deserialize)]
struct RawDecision {
    status: Option<String>,
    element_name: Option<String>,
    action_type: Option<UiActionType>,
    value: Option<Value>,
    reasoning: Option<String>,
}

/// Parse an oracle reply. Markdown code fences (```` ```json ````) are stripped first.
pub fn parse_decision(reply: &str) -> Result<Decision, AutomationError> {
    let body = strip_fences(reply);
    let raw: RawDecision = serde_json::from_str(body).map_err(|e| {
        AutomationError::Oracle(format!(
            "invalid decision JSON ({e}): {}",
            body.chars().take(200).collect::<String>()
        ))
    })?;

    match raw.status.as_deref().map(str::to_lowercase).as_deref() {
        Some("complete") => return Ok(Decision::Complete { reasoning: raw.reasoning }),
        Some("not_found") => return Ok(Decision::NotFound { reasoning: raw.reasoning }),
        _ => {}
    }

    let element_name = raw
        .element_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AutomationError::Oracle("decision has no element_name".to_string()))?;
    Ok(Decision::Act {
        element_name,
        action_type: raw.action_type.unwrap_or(UiActionType::Click),
        value: raw.value.filter(|v| !v.is_null()),
        reasoning: raw.reasoning,
    })
}

fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_matches('`').trim();
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

const SYSTEM_PROMPT: &str = "You are a Windows UI automation expert. Analyze UI and decide the NEXT action in a multi-step process.";

/// Build the user prompt for a decision request.
pub fn build_prompt(request: &DecisionRequest) -> String {
    let steps_context = if request.steps_completed.is_empty() {
        "This is the first step".to_string()
    } else {
        format!("Steps completed so far: {:?}", request.steps_completed)
    };
    let controls = serde_json::to_string_pretty(&request.available_controls)
        .unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are analyzing a Windows UI to achieve this goal: "{goal}"

{steps_context}

Window: {window}

Available controls (already-used elements have been removed):
{controls}

Rules:
1. For "turn on/off" goals, look for ToggleButton or Button controls and check their "state".
2. Never pick an element that was already used; choose a different control.
3. Do not click navigation entries you already navigated through.
4. Prefer ToggleButton over Button over Hyperlink over Text.
5. To flip a ToggleButton, use action_type "click" on it.

Respond with ONLY a JSON object:
{{
  "element_name": "exact name of control to interact with",
  "action_type": "click|toggle|set_value",
  "value": true/false for toggle, number for slider, or null for click,
  "reasoning": "brief explanation"
}}

If the goal is already achieved, respond with:
{{"status": "complete", "reasoning": "explanation"}}

If no suitable control is visible, respond with:
{{"status": "not_found", "reasoning": "explanation"}}
"#,
        goal = request.goal,
        window = request.window_title,
    )
}

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    pub fn new(config: OracleConfig) -> Result<Self, AutomationError> {
        if config.api_key.is_none() {
            return Err(AutomationError::InvalidArgument(
                "OPENAI_API_KEY is not set; the decision oracle needs an API key".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl DecisionOracle for ChatCompletionsOracle {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision, AutomationError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(request)}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        });

        info!(
            "[oracle] Asking {} ({} controls, {} steps done)",
            self.config.model,
            request.available_controls.len(),
            request.steps_completed.len()
        );
        let mut builder = self.client.post(self.endpoint()).json(&payload);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutomationError::Oracle(format!(
                "backend returned {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AutomationError::Oracle("response has no message content".to_string()))?;
        debug!("[oracle] Raw decision: {content}");
        parse_decision(content)
    }
}
