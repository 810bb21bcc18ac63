//! Action identifiers mapped to their handlers.

use crate::errors::AutomationError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Something a plan step can invoke.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError>;

    /// One-line description shown by `deskpilot actions`.
    fn description(&self) -> &str {
        ""
    }
}

/// Typed view over a step's argument map.
pub trait ActionArgs {
    fn parse<T: DeserializeOwned>(&self) -> Result<T, AutomationError>;
}

impl ActionArgs for Map<String, Value> {
    fn parse<T: DeserializeOwned>(&self) -> Result<T, AutomationError> {
        serde_json::from_value(Value::Object(self.clone()))
            .map_err(|e| AutomationError::InvalidArgument(e.to_string()))
    }
}

/// Adapts an async closure into an [`ActionHandler`].
pub struct FnHandler<F> {
    func: F,
    description: String,
}

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, AutomationError>> + Send + 'static,
{
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        (self.func)(args.clone()).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Immutable lookup table built once through [`ActionRegistry::builder`].
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action).cloned()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// `(identifier, description)` pairs in sorted order.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct ActionRegistryBuilder {
    handlers: BTreeMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistryBuilder {
    pub fn handler(mut self, action: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
        let action = action.into();
        if self.handlers.insert(action.clone(), Arc::new(handler)).is_some() {
            warn!("[registry] handler for '{action}' registered twice; keeping the last one");
        }
        self
    }

    pub fn handler_fn<F, Fut>(
        self,
        action: impl Into<String>,
        description: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AutomationError>> + Send + 'static,
    {
        self.handler(
            action,
            FnHandler {
                func,
                description: description.into(),
            },
        )
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct GreetArgs {
        name: String,
        #[serde(default)]
        shout: bool,
    }

    #[tokio::test]
    async fn test_closure_handler_is_invoked() {
        let registry = ActionRegistry::builder()
            .handler_fn("greet", "Say hello", |args| async move {
                let args: GreetArgs = args.parse()?;
                let greeting = format!("hello {}", args.name);
                Ok::<_, AutomationError>(json!(if args.shout {
                    greeting.to_uppercase()
                } else {
                    greeting
                }))
            })
            .build();

        let handler = registry.get("greet").unwrap();
        let args = json!({"name": "world", "shout": true});
        let out = handler.call(args.as_object().unwrap()).await.unwrap();
        assert_eq!(out, json!("HELLO WORLD"));
        assert_eq!(registry.describe(), vec![("greet".to_string(), "Say hello".to_string())]);
    }

    #[test]
    fn test_unknown_action_is_absent() {
        let registry = ActionRegistry::builder().build();
        assert!(registry.get("format_disk").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_reports_invalid_arguments() {
        let args = json!({"shout": true});
        let err = args.as_object().unwrap().parse::<GreetArgs>().unwrap_err();
        assert!(matches!(err, AutomationError::InvalidArgument(msg) if msg.contains("name")));
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = ActionRegistry::builder()
            .handler_fn("b", "", |_| async { Ok::<_, AutomationError>(Value::Null) })
            .handler_fn("a", "", |_| async { Ok::<_, AutomationError>(Value::Null) })
            .build();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
