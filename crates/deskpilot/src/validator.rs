//! Pre-execution plan checks.

use crate::config::ValidationConfig;
use crate::plan::Plan;
use crate::registry::ActionRegistry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn rejected(error: String, warnings: Vec<String>) -> Self {
        Self {
            valid: false,
            error: Some(error),
            warnings,
        }
    }
}

pub trait PlanValidator: Send + Sync {
    fn validate(&self, plan: &Plan) -> ValidationReport;
}

/// Rejects plans that are too long or use actions outside the allowlist, and
/// warns about risky steps.
pub struct AllowlistValidator {
    config: ValidationConfig,
    known_actions: Vec<String>,
}

impl AllowlistValidator {
    /// With an empty `allowed_actions` list, every action known to `registry` is allowed.
    pub fn new(config: ValidationConfig, registry: &ActionRegistry) -> Self {
        Self::with_known_actions(config, registry.names())
    }

    /// Validate against a fixed set of action names, without a live registry.
    pub fn with_known_actions<I, S>(config: ValidationConfig, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            config,
            known_actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    fn is_allowed(&self, action: &str) -> bool {
        if self.config.allowed_actions.is_empty() {
            self.known_actions.iter().any(|a| a == action)
        } else {
            self.config.allowed_actions.iter().any(|a| a == action)
        }
    }
}

impl PlanValidator for AllowlistValidator {
    fn validate(&self, plan: &Plan) -> ValidationReport {
        let mut warnings = Vec::new();

        let max = self.config.max_actions_per_plan;
        if plan.len() > max {
            return ValidationReport::rejected(
                format!("Plan exceeds maximum actions limit ({} > {})", plan.len(), max),
                warnings,
            );
        }

        for (i, step) in plan.steps.iter().enumerate() {
            let n = i + 1;
            if !self.is_allowed(&step.action) {
                return ValidationReport::rejected(
                    format!("Step {n} validation failed: action '{}' is not allowed", step.action),
                    warnings,
                );
            }
            if self.config.always_confirm_actions.contains(&step.action) {
                warnings.push(format!(
                    "Step {n}: Action '{}' requires explicit confirmation",
                    step.action
                ));
            }
            if let Some(risk) = &step.risk_level {
                if self
                    .config
                    .warn_on_risk
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(risk))
                {
                    warnings.push(format!("Step {n}: '{}' is marked {risk} risk", step.action));
                }
            }
        }

        ValidationReport {
            valid: true,
            error: None,
            warnings,
        }
    }
}
