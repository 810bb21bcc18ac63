//! Plan documents and per-step results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One requested action. Steps are never mutated once issued; the executor
/// resolves references into a copy of `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    /// A failure of this step aborts the rest of the plan.
    #[serde(default)]
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
}

impl Step {
    pub fn new(action: impl Into<String>, args: Value) -> Self {
        Self {
            action: action.into(),
            args: match args {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            critical: false,
            risk_level: None,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// Ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// Plans arrive either as a bare array or wrapped as `{"steps": [...]}`.
impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(Vec<Step>),
            Wrapped { steps: Vec<Step> },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(steps) | Repr::Wrapped { steps } => Plan { steps },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub action: String,
    /// Arguments after reference resolution.
    pub args: Map<String, Value>,
    pub status: StepStatus,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub critical: bool,
}

impl StepResult {
    pub fn success(action: &str, args: Map<String, Value>, output: Value) -> Self {
        Self {
            action: action.to_string(),
            args,
            status: StepStatus::Success,
            output,
            error: None,
            critical: false,
        }
    }

    pub fn error(
        action: &str,
        args: Map<String, Value>,
        error: impl Into<String>,
        critical: bool,
    ) -> Self {
        Self {
            action: action.to_string(),
            args,
            status: StepStatus::Error,
            output: Value::Null,
            error: Some(error.into()),
            critical,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}
