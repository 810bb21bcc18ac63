//! Actions over arbitrary windows: introspection, single actions, guided navigation.

use crate::config::NavigationConfig;
use crate::errors::AutomationError;
use crate::navigation::{execute_ui_action, GuidedNavigator, NavigationRequest};
use crate::oracle::{DecisionOracle, UiActionType};
use crate::registry::{ActionArgs, ActionHandler};
use crate::Desktop;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub struct IntrospectUi {
    desktop: Desktop,
}

impl IntrospectUi {
    pub fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }
}

#[derive(Deserialize)]
struct IntrospectArgs {
    window_search_terms: Vec<String>,
    #[serde(default)]
    open_command: Option<String>,
}

#[async_trait]
impl ActionHandler for IntrospectUi {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: IntrospectArgs = args.parse()?;
        let snapshot = self
            .desktop
            .introspect(&args.window_search_terms, args.open_command.as_deref())
            .await
            .ok_or_else(|| {
                AutomationError::ElementNotFound(format!(
                    "no window matching {:?}",
                    args.window_search_terms
                ))
            })?;
        Ok(json!({
            "window": snapshot.window,
            "controls": snapshot.controls,
            "strategy": format!(
                "Introspected {} controls in '{}'",
                snapshot.controls.len(),
                snapshot.window
            ),
        }))
    }

    fn description(&self) -> &str {
        "List the controls of a window (optionally opening it first)"
    }
}

pub struct ExecuteUiAction {
    desktop: Desktop,
}

impl ExecuteUiAction {
    pub fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }
}

#[derive(Deserialize)]
struct ExecuteArgs {
    window_search_terms: Vec<String>,
    element_name: String,
    action_type: UiActionType,
    #[serde(default)]
    value: Option<Value>,
}

#[async_trait]
impl ActionHandler for ExecuteUiAction {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: ExecuteArgs = args.parse()?;
        let message = execute_ui_action(
            &self.desktop,
            &args.window_search_terms,
            &args.element_name,
            args.action_type,
            args.value.as_ref(),
        )
        .await?;
        Ok(Value::String(message))
    }

    fn description(&self) -> &str {
        "Click, toggle or set the value of a named control"
    }
}

pub struct AiNavigate {
    desktop: Desktop,
    oracle: Option<Arc<dyn DecisionOracle>>,
    config: NavigationConfig,
}

impl AiNavigate {
    pub fn new(
        desktop: Desktop,
        oracle: Option<Arc<dyn DecisionOracle>>,
        config: NavigationConfig,
    ) -> Self {
        Self {
            desktop,
            oracle,
            config,
        }
    }
}

#[async_trait]
impl ActionHandler for AiNavigate {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let request: NavigationRequest = args.parse()?;
        let oracle = self.oracle.clone().ok_or_else(|| {
            AutomationError::UnsupportedOperation(
                "ai_navigate needs a decision oracle; set OPENAI_API_KEY".to_string(),
            )
        })?;
        let navigator = GuidedNavigator::new(self.desktop.clone(), oracle, self.config.clone());
        let outcome = navigator.navigate(&request).await?;
        Ok(serde_json::to_value(outcome)?)
    }

    fn description(&self) -> &str {
        "Reach a UI goal step by step, letting the decision oracle pick each control"
    }
}
