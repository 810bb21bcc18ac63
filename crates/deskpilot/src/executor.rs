//! Sequential plan execution.
//!
//! Steps run strictly in order. Before each step its arguments are resolved
//! against the results recorded so far, which is the only way a step can see
//! the output of an earlier one. There is no rollback: results of steps that
//! already ran stay recorded when a later step aborts the plan.

use crate::audit::{AuditRecord, AuditSink};
use crate::plan::{Plan, Step, StepResult};
use crate::registry::ActionRegistry;
use crate::resolver::resolve_references;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Everything one `execute` call produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// One entry per executed step, in execution order.
    pub results: Vec<StepResult>,
    /// Number of steps in the plan.
    pub planned: usize,
    /// True when a critical failure stopped the plan early.
    pub aborted: bool,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.aborted && self.succeeded() == self.planned
    }

    /// "N of M steps succeeded", counted against the whole plan.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} of {} steps succeeded", self.succeeded(), self.planned);
        if self.aborted {
            summary.push_str(&format!(
                " (stopped after step {} on a critical failure)",
                self.results.len()
            ));
        }
        summary
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}

pub struct PlanExecutor {
    registry: ActionRegistry,
    audit: Option<Arc<dyn AuditSink>>,
}

impl PlanExecutor {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            audit: None,
        }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    #[instrument(skip(self, plan), fields(steps = plan.len()))]
    pub async fn execute(&self, plan: &Plan) -> ExecutionReport {
        let mut results: Vec<StepResult> = Vec::with_capacity(plan.len());
        let mut aborted = false;

        for (index, step) in plan.steps.iter().enumerate() {
            info!(
                "[executor] Step {}/{}: {}",
                index + 1,
                plan.len(),
                step.action
            );
            let started = Instant::now();
            let result = self.execute_step(step, &results).await;

            if let Some(sink) = &self.audit {
                sink.record(&AuditRecord::from_result(
                    &result,
                    started.elapsed().as_millis() as u64,
                ));
            }

            let stop = !result.is_success() && result.critical;
            results.push(result);

            if stop {
                error!(
                    "[executor] Critical failure at step {}; skipping the remaining {} step(s)",
                    index + 1,
                    plan.len() - index - 1
                );
                aborted = true;
                break;
            }
        }

        let report = ExecutionReport {
            results,
            planned: plan.len(),
            aborted,
        };
        info!("[executor] {}", report.summary());
        report
    }

    async fn execute_step(&self, step: &Step, previous: &[StepResult]) -> StepResult {
        let args = resolve_references(&step.args, previous);

        let Some(handler) = self.registry.get(&step.action) else {
            warn!("[executor] Unknown action '{}'", step.action);
            // Dispatch errors never abort the plan.
            return StepResult::error(
                &step.action,
                args,
                format!("Unknown action: {}", step.action),
                false,
            );
        };

        match handler.call(&args).await {
            Ok(output) => {
                debug!("[executor] '{}' returned {}", step.action, output);
                StepResult::success(&step.action, args, output)
            }
            Err(e) => {
                warn!("[executor] '{}' failed: {}", step.action, e);
                StepResult::error(&step.action, args, e.to_string(), step.critical)
            }
        }
    }
}
