//! Plan execution and goal-directed navigation over desktop accessibility trees
//!
//! A [`Plan`] of steps is run by the [`PlanExecutor`], which resolves
//! cross-step references and dispatches each step through an [`ActionRegistry`].
//! UI-facing actions work against a [`Desktop`]: window and control discovery,
//! idempotent interaction, the oracle-driven [`GuidedNavigator`] and
//! [`StrategyChain`] fallbacks for hard-to-reach system controls.

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, instrument};

pub mod actions;
pub mod audit;
pub mod config;
pub mod discovery;
pub mod element;
pub mod errors;
pub mod executor;
pub mod interaction;
pub mod navigation;
pub mod oracle;
pub mod plan;
pub mod platforms;
pub mod registry;
pub mod resolver;
pub mod snapshot;
pub mod strategy;
#[cfg(test)]
mod tests;
pub mod validator;

pub use actions::{default_registry, BUILTIN_ACTIONS};
pub use audit::{AuditRecord, AuditSink, JsonlAuditLog};
pub use config::{AgentConfig, DiscoveryConfig, NavigationConfig, OracleConfig};
pub use discovery::{descendants, find_control, first_of_kind};
pub use element::{ControlKind, RangeValue, UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use executor::{ExecutionReport, PlanExecutor};
pub use interaction::SliderTarget;
pub use navigation::{
    execute_ui_action, GuidedNavigator, NavigationOutcome, NavigationRequest, NavigationStatus,
    WindowRouting,
};
pub use oracle::{ChatCompletionsOracle, Decision, DecisionOracle, DecisionRequest, UiActionType};
pub use plan::{Plan, Step, StepResult, StepStatus};
pub use platforms::{AccessibilityEngine, MediaKey};
pub use registry::{ActionArgs, ActionHandler, ActionRegistry};
pub use resolver::resolve_references;
pub use snapshot::{ControlSnapshot, ToggleState, UiSnapshot};
pub use strategy::{Strategy, StrategyChain, StrategySuccess};
pub use validator::{AllowlistValidator, PlanValidator, ValidationReport};

/// Entry point for everything that touches the live desktop.
///
/// Cheap to clone; clones share the same engine.
#[derive(Clone)]
pub struct Desktop {
    engine: Arc<dyn AccessibilityEngine>,
    timings: DiscoveryConfig,
}

impl Desktop {
    /// Desktop backed by the current platform's accessibility engine.
    #[instrument(skip(timings))]
    pub fn new(timings: DiscoveryConfig) -> Result<Self, AutomationError> {
        let engine = platforms::create_engine()?;
        Ok(Self { engine, timings })
    }

    /// Desktop over an explicit engine (tests use an in-memory one).
    pub fn with_engine(engine: Arc<dyn AccessibilityEngine>, timings: DiscoveryConfig) -> Self {
        Self { engine, timings }
    }

    pub fn engine(&self) -> &Arc<dyn AccessibilityEngine> {
        &self.engine
    }

    pub fn timings(&self) -> &DiscoveryConfig {
        &self.timings
    }

    /// Start a program or URI and wait for it to come up.
    #[instrument(skip(self))]
    pub async fn launch(&self, target: &str) -> Result<(), AutomationError> {
        info!("[desktop] Opening: {target}");
        self.engine.open(target)?;
        sleep(self.timings.launch_settle()).await;
        Ok(())
    }

    /// Open an `ms-settings:` page and return the Settings window.
    #[instrument(skip(self))]
    pub async fn open_settings_page(&self, uri: &str) -> Option<UIElement> {
        if let Err(e) = self.launch(uri).await {
            info!("[desktop] Failed to open settings: {e}");
            return None;
        }
        self.find_window(&["Settings"], self.timings.window_timeout())
            .await
    }

    /// Inject a media key `repeat` times.
    pub fn press_media_key(&self, key: MediaKey, repeat: u32) -> Result<(), AutomationError> {
        self.engine.press_media_key(key, repeat)
    }
}
