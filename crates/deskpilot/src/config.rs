//! Runtime configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes.
//! Environment variables are applied on top of the file by [`AgentConfig::apply_env`].

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub discovery: DiscoveryConfig,
    pub navigation: NavigationConfig,
    pub oracle: OracleConfig,
    pub validation: ValidationConfig,
    pub audit: AuditConfig,
}

/// Polling and settle timings for window/control lookup and interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub poll_interval_ms: u64,
    pub window_timeout_ms: u64,
    /// Pause after focusing a control, before clicking it.
    pub focus_settle_ms: u64,
    /// Pause after a click.
    pub click_settle_ms: u64,
    /// Pause after launching a program or URI before looking for its window.
    pub launch_settle_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            window_timeout_ms: 5_000,
            focus_settle_ms: 200,
            click_settle_ms: 300,
            launch_settle_ms: 1_500,
        }
    }
}

impl DiscoveryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn window_timeout(&self) -> Duration {
        Duration::from_millis(self.window_timeout_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.launch_settle_ms)
    }

    /// All waits set to zero. Used by tests against the in-memory engine.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 0,
            window_timeout_ms: 0,
            focus_settle_ms: 0,
            click_settle_ms: 0,
            launch_settle_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub max_attempts: u32,
    pub max_steps: u32,
    /// Wait after each successful action for the UI to react.
    pub settle_delay_ms: u64,
    /// Wait before retrying after a window lookup or action failure.
    pub retry_delay_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_steps: 10,
            settle_delay_ms: 2_000,
            retry_delay_ms: 1_000,
        }
    }
}

impl NavigationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// OpenAI-compatible chat completions endpoint used as the decision oracle.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed action identifiers. Empty means "every registered action".
    pub allowed_actions: Vec<String>,
    pub max_actions_per_plan: usize,
    /// Actions that always carry a confirmation warning.
    pub always_confirm_actions: Vec<String>,
    /// Risk levels that produce a warning (`risk_level` on a step).
    pub warn_on_risk: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_actions: Vec::new(),
            max_actions_per_plan: 50,
            always_confirm_actions: Vec::new(),
            warn_on_risk: vec!["high".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Defaults to `<local data dir>/deskpilot/audit.jsonl`.
    pub path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl AuditConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("deskpilot")
                .join("audit.jsonl")
        })
    }
}

impl AgentConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, AutomationError> {
        let raw = std::fs::read_to_string(path)?;
        let config: AgentConfig = serde_json::from_str(&raw)?;
        debug!("[config] loaded {}", path.display());
        Ok(config)
    }

    /// Overlay environment variables.
    pub fn apply_env(mut self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok());
        self
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
            raw.and_then(|v| v.trim().parse().ok())
        }

        if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.oracle.api_key = Some(key);
        }
        if let Some(model) = var("MODEL_NAME").filter(|m| !m.trim().is_empty()) {
            self.oracle.model = model;
        }
        if let Some(url) = var("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.oracle.base_url = url;
        }
        if let Some(v) = parsed(var("DESKPILOT_MAX_STEPS")) {
            self.navigation.max_steps = v;
        }
        if let Some(v) = parsed(var("DESKPILOT_MAX_ATTEMPTS")) {
            self.navigation.max_attempts = v;
        }
        if let Some(v) = parsed(var("DESKPILOT_SETTLE_DELAY_MS")) {
            self.navigation.settle_delay_ms = v;
        }
        if let Some(v) = parsed(var("DESKPILOT_WINDOW_TIMEOUT_MS")) {
            self.discovery.window_timeout_ms = v;
        }
        if let Some(v) = parsed(var("DESKPILOT_POLL_INTERVAL_MS")) {
            self.discovery.poll_interval_ms = v;
        }
        if let Some(v) = parsed::<String>(var("DESKPILOT_DISABLE_AUDIT")) {
            if matches!(v.to_lowercase().as_str(), "1" | "true" | "yes") {
                self.audit.enabled = false;
            }
        }
        if let Some(path) = var("DESKPILOT_AUDIT_LOG").filter(|p| !p.trim().is_empty()) {
            self.audit.path = Some(PathBuf::from(path));
        }
    }
}
