//! Ordered fallback across alternative ways of reaching the same outcome.

use crate::errors::AutomationError;
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, instrument, warn};

/// One way of achieving the chain's goal. Runs to completion before the next is tried.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;
    async fn attempt(&self) -> Result<String, AutomationError>;
}

type BoxedAttempt = Pin<Box<dyn Future<Output = Result<String, AutomationError>> + Send>>;

/// Strategy built from a closure.
pub struct FnStrategy<F> {
    name: String,
    func: F,
}

impl<F> FnStrategy<F>
where
    F: Fn() -> BoxedAttempt + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Strategy for FnStrategy<F>
where
    F: Fn() -> BoxedAttempt + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self) -> Result<String, AutomationError> {
        (self.func)().await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategySuccess {
    /// Name of the strategy that succeeded.
    pub strategy: String,
    pub message: String,
    /// `(strategy, reason)` for every strategy that failed before it.
    pub failures: Vec<(String, String)>,
}

#[derive(Default)]
pub struct StrategyChain {
    label: String,
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order; the first success ends the chain.
    #[instrument(skip(self), fields(chain = %self.label))]
    pub async fn run(&self) -> Result<StrategySuccess, AutomationError> {
        let mut failures = Vec::new();
        let total = self.strategies.len();

        for (i, strategy) in self.strategies.iter().enumerate() {
            info!(
                "[strategy] {} {}/{}: {}",
                self.label,
                i + 1,
                total,
                strategy.name()
            );
            match strategy.attempt().await {
                Ok(message) => {
                    info!("[strategy] '{}' succeeded: {message}", strategy.name());
                    return Ok(StrategySuccess {
                        strategy: strategy.name().to_string(),
                        message,
                        failures,
                    });
                }
                Err(e) => {
                    warn!("[strategy] '{}' failed: {e}", strategy.name());
                    failures.push((strategy.name().to_string(), e.to_string()));
                }
            }
        }

        Err(AutomationError::StrategiesExhausted(failures))
    }
}
