use crate::errors::AutomationError;
use crate::registry::{ActionArgs, ActionHandler};
use crate::Desktop;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

/// Echoes a conversational message back as the step output.
pub struct Chat;

#[derive(Deserialize)]
struct ChatArgs {
    message: String,
}

#[async_trait]
impl ActionHandler for Chat {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: ChatArgs = args.parse()?;
        Ok(Value::String(args.message))
    }

    fn description(&self) -> &str {
        "Reply with a message (no desktop interaction)"
    }
}

pub struct LaunchApp {
    desktop: Desktop,
}

impl LaunchApp {
    pub fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }
}

#[derive(Deserialize)]
struct LaunchArgs {
    command: String,
    #[serde(default)]
    args: Option<String>,
}

#[async_trait]
impl ActionHandler for LaunchApp {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: LaunchArgs = args.parse()?;
        let command = args.command.trim();
        if command.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "command must not be empty".to_string(),
            ));
        }
        let full = match args.args.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{command} {extra}"),
            _ => command.to_string(),
        };
        info!("[launch_app] {full}");
        self.desktop.launch(&full).await?;
        Ok(json!({ "launched": full }))
    }

    fn description(&self) -> &str {
        "Start a program, shell command or URI"
    }
}
