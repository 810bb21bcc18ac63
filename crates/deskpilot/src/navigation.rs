//! Goal-directed UI navigation.
//!
//! Each step introspects a window, asks the [`DecisionOracle`] what to do next,
//! performs that action and waits for the UI to settle. Steps repeat until the
//! oracle reports completion or a bound is hit. Nothing is hardcoded about the
//! path to the goal: the oracle picks among the controls that are actually
//! visible, minus those already acted on.

use crate::config::NavigationConfig;
use crate::discovery::{descendants, find_control};
use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::oracle::{Decision, DecisionOracle, DecisionRequest, UiActionType};
use crate::snapshot::parse_unnamed_label;
use crate::Desktop;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Vocabulary that marks a goal as an in-place Settings change rather than a wizard.
pub const SETTINGS_INDICATORS: &[&str] = &[
    "settings",
    "firewall",
    "bluetooth",
    "wifi",
    "network",
    "defender",
    "display",
    "sound",
    "privacy",
    "update",
    "storage",
    "personalization",
    "system",
    "turn off",
    "turn on",
    "enable",
    "disable",
    "toggle",
];

/// Window terms used to follow wizard and dialog flows.
pub const WIZARD_TERMS: &[&str] = &["", "wizard", "install", "uninstall", "setup", "dialog"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub goal: String,
    pub window_search_terms: Vec<String>,
    #[serde(default)]
    pub open_command: Option<String>,
    /// Defaults to the configured `max_attempts`.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// With `false` only a single action is taken.
    #[serde(default = "default_multi_step")]
    pub multi_step: bool,
    /// Defaults to the configured `max_steps`.
    #[serde(default)]
    pub max_steps: Option<u32>,
}

fn default_multi_step() -> bool {
    true
}

impl NavigationRequest {
    pub fn new(goal: impl Into<String>, window_search_terms: Vec<String>) -> Self {
        Self {
            goal: goal.into(),
            window_search_terms,
            open_command: None,
            max_attempts: None,
            multi_step: true,
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Introspecting,
    Deciding,
    Acting,
    Verifying,
    Complete,
    Failed,
}

/// An action already taken during this navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedStep {
    pub element_name: String,
    pub action: UiActionType,
}

impl fmt::Display for CompletedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            UiActionType::Click => "Clicked",
            UiActionType::Toggle => "Toggled",
            UiActionType::SetValue => "Set",
        };
        write!(f, "{verb} '{}'", self.element_name)
    }
}

/// Per-call progress. Created when navigation starts and dropped when it ends.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub goal: String,
    pub steps_completed: Vec<CompletedStep>,
    pub step_index: u32,
    pub attempt_index: u32,
    pub phase: Phase,
}

impl NavigationState {
    fn new(goal: &str) -> Self {
        Self {
            goal: goal.to_string(),
            steps_completed: Vec::new(),
            step_index: 0,
            attempt_index: 0,
            phase: Phase::Introspecting,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(
            "[navigation] step {} attempt {}: {:?} -> {:?}",
            self.step_index + 1,
            self.attempt_index + 1,
            self.phase,
            phase
        );
        self.phase = phase;
    }

    fn acted_on(&self) -> Vec<&str> {
        self.steps_completed
            .iter()
            .map(|s| s.element_name.as_str())
            .collect()
    }

    fn descriptions(&self) -> Vec<String> {
        self.steps_completed.iter().map(ToString::to_string).collect()
    }

    fn outcome(&mut self, status: NavigationStatus) -> NavigationOutcome {
        self.enter(Phase::Complete);
        let descriptions = self.descriptions();
        let lead = match status {
            NavigationStatus::Achieved => "Goal achieved",
            NavigationStatus::LikelyAchieved => "Goal likely achieved",
            NavigationStatus::MaxStepsReached => "Step limit reached",
        };
        NavigationOutcome {
            status,
            message: format!(
                "{lead} after {} steps: {}",
                descriptions.len(),
                descriptions.join(", ")
            ),
            steps_completed: descriptions,
        }
    }

    /// A step ran out of attempts without finding a window or control: earlier
    /// progress means the goal was probably reached, otherwise the error stands.
    fn give_up(&mut self, error: AutomationError) -> Result<NavigationOutcome, AutomationError> {
        if self.step_index > 0 {
            info!("[navigation] Attempts exhausted after progress; assuming goal complete ({error})");
            Ok(self.outcome(NavigationStatus::LikelyAchieved))
        } else {
            self.fail(error)
        }
    }

    /// Terminal failure regardless of earlier progress.
    fn fail(&mut self, error: AutomationError) -> Result<NavigationOutcome, AutomationError> {
        warn!(
            "[navigation] Giving up after {} completed steps: {error}",
            self.steps_completed.len()
        );
        self.enter(Phase::Failed);
        Err(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStatus {
    /// The oracle reported the goal complete.
    Achieved,
    /// No further window or control was found after earlier progress.
    LikelyAchieved,
    /// `max_steps` actions were taken without a completion report.
    MaxStepsReached,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigationOutcome {
    pub status: NavigationStatus,
    pub message: String,
    pub steps_completed: Vec<String>,
}

/// Which windows a step looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRouting {
    /// The caller's own search terms.
    CallerTerms,
    /// Any window except shell surfaces.
    AnyWindow,
    /// Wizard and dialog windows.
    WizardDialogs,
}

impl WindowRouting {
    /// Step 0 always uses the caller's terms. Settings-style goals keep them for
    /// step 1 and then follow whatever window is in front; other goals follow
    /// wizard and dialog windows from step 1 on.
    pub fn for_step<S: AsRef<str>>(goal: &str, terms: &[S], step_index: u32) -> Self {
        if step_index == 0 {
            return Self::CallerTerms;
        }
        if is_settings_flow(goal, terms) {
            if step_index > 1 {
                Self::AnyWindow
            } else {
                Self::CallerTerms
            }
        } else {
            Self::WizardDialogs
        }
    }

    pub fn terms<S: AsRef<str>>(&self, caller: &[S]) -> Vec<String> {
        match self {
            Self::CallerTerms => caller.iter().map(|t| t.as_ref().to_string()).collect(),
            Self::AnyWindow => vec![String::new()],
            Self::WizardDialogs => WIZARD_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub fn is_settings_flow<S: AsRef<str>>(goal: &str, terms: &[S]) -> bool {
    let goal = goal.to_lowercase();
    let terms = terms
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    SETTINGS_INDICATORS
        .iter()
        .any(|indicator| goal.contains(indicator) || terms.contains(indicator))
}

/// Drives a [`NavigationRequest`] to completion.
pub struct GuidedNavigator {
    desktop: Desktop,
    oracle: Arc<dyn DecisionOracle>,
    config: NavigationConfig,
}

enum StepFlow {
    Advanced,
    Finished(NavigationOutcome),
}

impl GuidedNavigator {
    pub fn new(desktop: Desktop, oracle: Arc<dyn DecisionOracle>, config: NavigationConfig) -> Self {
        Self {
            desktop,
            oracle,
            config,
        }
    }

    #[instrument(skip(self, request), fields(goal = %request.goal))]
    pub async fn navigate(
        &self,
        request: &NavigationRequest,
    ) -> Result<NavigationOutcome, AutomationError> {
        let max_steps = if request.multi_step {
            request.max_steps.unwrap_or(self.config.max_steps).max(1)
        } else {
            1
        };
        let max_attempts = request
            .max_attempts
            .unwrap_or(self.config.max_attempts)
            .max(1);

        info!(
            "[navigation] Goal: '{}' (multi-step: {}, up to {} steps x {} attempts)",
            request.goal, request.multi_step, max_steps, max_attempts
        );

        let mut state = NavigationState::new(&request.goal);
        for step_index in 0..max_steps {
            state.step_index = step_index;
            info!("[navigation] === Step {}/{} ===", step_index + 1, max_steps);
            match self.run_step(request, &mut state, max_attempts).await? {
                StepFlow::Advanced => {}
                StepFlow::Finished(outcome) => return Ok(outcome),
            }
        }

        let status = if request.multi_step {
            NavigationStatus::MaxStepsReached
        } else {
            NavigationStatus::Achieved
        };
        Ok(state.outcome(status))
    }

    async fn run_step(
        &self,
        request: &NavigationRequest,
        state: &mut NavigationState,
        max_attempts: u32,
    ) -> Result<StepFlow, AutomationError> {
        let routing = WindowRouting::for_step(
            &request.goal,
            &request.window_search_terms,
            state.step_index,
        );
        let terms = routing.terms(&request.window_search_terms);
        debug!("[navigation] Window routing {:?}: {:?}", routing, terms);

        for attempt in 0..max_attempts {
            state.attempt_index = attempt;
            let last_attempt = attempt + 1 == max_attempts;
            info!("[navigation] Attempt {}/{}", attempt + 1, max_attempts);

            state.enter(Phase::Introspecting);
            let open = if state.step_index == 0 && attempt == 0 {
                request.open_command.as_deref()
            } else {
                None
            };
            let Some(snapshot) = self.desktop.introspect(&terms, open).await else {
                if last_attempt {
                    return finish(state.give_up(AutomationError::ElementNotFound(format!(
                        "no window matching {terms:?}"
                    ))));
                }
                sleep(self.config.retry_delay()).await;
                continue;
            };

            state.enter(Phase::Deciding);
            let decision_request = DecisionRequest {
                goal: request.goal.clone(),
                steps_completed: state.descriptions(),
                window_title: snapshot.window.clone(),
                available_controls: snapshot.without(&state.acted_on()),
            };
            let decision = match self.oracle.decide(&decision_request).await {
                Ok(decision) => decision,
                Err(e) => {
                    warn!("[navigation] Oracle failed: {e}");
                    if last_attempt {
                        return finish(state.fail(e));
                    }
                    sleep(self.config.retry_delay()).await;
                    continue;
                }
            };
            debug!("[navigation] Decision: {:?}", decision);

            match decision {
                Decision::Complete { reasoning } => {
                    info!("[navigation] Oracle reports goal complete: {}", reasoning.unwrap_or_default());
                    return Ok(StepFlow::Finished(state.outcome(NavigationStatus::Achieved)));
                }
                Decision::NotFound { reasoning } => {
                    let reasoning = reasoning.unwrap_or_default();
                    info!("[navigation] Oracle found no suitable control: {reasoning}");
                    if last_attempt {
                        return finish(state.give_up(AutomationError::ElementNotFound(format!(
                            "oracle could not find a control for '{}': {reasoning}",
                            request.goal
                        ))));
                    }
                }
                Decision::Act {
                    element_name,
                    action_type,
                    value,
                    ..
                } => {
                    state.enter(Phase::Acting);
                    match execute_ui_action(
                        &self.desktop,
                        &terms,
                        &element_name,
                        action_type,
                        value.as_ref(),
                    )
                    .await
                    {
                        Ok(message) => {
                            info!("[navigation] Step {}: {message}", state.step_index + 1);
                            state.steps_completed.push(CompletedStep {
                                element_name,
                                action: action_type,
                            });
                            state.enter(Phase::Verifying);
                            sleep(self.config.settle_delay()).await;
                            return Ok(StepFlow::Advanced);
                        }
                        Err(e) => {
                            warn!("[navigation] Action on '{element_name}' failed: {e}");
                            if last_attempt {
                                return finish(state.give_up(e));
                            }
                            sleep(self.config.retry_delay()).await;
                        }
                    }
                }
            }
        }

        Err(AutomationError::ActionFailed(format!(
            "no attempt made for '{}'",
            request.goal
        )))
    }
}

fn finish(result: Result<NavigationOutcome, AutomationError>) -> Result<StepFlow, AutomationError> {
    result.map(StepFlow::Finished)
}

/// Re-locate `element_name` in the window matching `terms` and act on it.
#[instrument(skip(desktop, terms, value))]
pub async fn execute_ui_action<S: AsRef<str>>(
    desktop: &Desktop,
    terms: &[S],
    element_name: &str,
    action_type: UiActionType,
    value: Option<&Value>,
) -> Result<String, AutomationError> {
    let window = desktop
        .find_window(terms, desktop.timings().window_timeout())
        .await
        .ok_or_else(|| {
            AutomationError::ElementNotFound(format!(
                "no window matching {:?}",
                terms.iter().map(AsRef::as_ref).collect::<Vec<_>>()
            ))
        })?;
    let control = locate_control(&window, element_name).ok_or_else(|| {
        AutomationError::ElementNotFound(format!(
            "control '{element_name}' in window '{}'",
            window.name_or_empty()
        ))
    })?;
    let kind = control.role();
    info!("[navigation] {:?} on {kind} '{element_name}'", action_type);

    match action_type {
        UiActionType::Toggle if kind.is_toggle() => match value.and_then(desired_state) {
            Some(desired) => {
                if desktop.set_toggle(&control, desired).await {
                    Ok(format!(
                        "Toggled '{element_name}' to {}",
                        if desired { "On" } else { "Off" }
                    ))
                } else {
                    Err(AutomationError::ActionFailed(format!(
                        "Failed to toggle '{element_name}'"
                    )))
                }
            }
            None => click_or_fail(desktop, &control, element_name).await,
        },
        UiActionType::Click | UiActionType::Toggle => {
            click_or_fail(desktop, &control, element_name).await
        }
        UiActionType::SetValue => {
            let value = value.cloned().unwrap_or(Value::Null);
            desktop.set_value(&control, &value)?;
            Ok(format!("Set '{element_name}' to {value}"))
        }
    }
}

async fn click_or_fail(
    desktop: &Desktop,
    control: &UIElement,
    element_name: &str,
) -> Result<String, AutomationError> {
    if desktop.click(control).await {
        Ok(format!("Clicked '{element_name}'"))
    } else {
        Err(AutomationError::ActionFailed(format!(
            "Failed to click '{element_name}'"
        )))
    }
}

/// Find a control by the name shown in a snapshot. Unnamed labels such as
/// `[Unnamed ToggleButton #2]` resolve to the n-th unnamed control of that kind.
/// An exact name match beats an earlier partial one.
fn locate_control(window: &UIElement, element_name: &str) -> Option<UIElement> {
    if let Some((kind, ordinal)) = parse_unnamed_label(element_name) {
        return descendants(window)
            .filter(|n| n.role() == kind && n.name().is_none())
            .nth(ordinal - 1);
    }
    find_control(window, element_name, None, false)
        .or_else(|| find_control(window, element_name, None, true))
}

pub(crate) fn desired_state(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" | "enable" | "enabled" => Some(true),
            "off" | "false" | "no" | "0" | "disable" | "disabled" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
