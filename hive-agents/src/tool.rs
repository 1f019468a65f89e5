//! Tools offered to a model, and the registry that dispatches them.

use async_trait::async_trait;
use hive_core::ToolSchema;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from tool lookup or execution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The input did not match the tool's schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A function the model may call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema of the input.
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool.
    async fn call(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// Tools available to one agent, keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Builder form of [`ToolRegistry::register`].
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Look up a tool.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Schemas of every tool, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Call the tool `name`.
    pub async fn call(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        match self.tools.get(name) {
            Some(tool) => tool.call(input).await,
            None => Err(ToolError::NotFound(name.to_owned())),
        }
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

/// The set of tools a [`crate::ToolAgent`] variant is built with.
///
/// `config` is the agent's `tool_config` entry, so one toolbox can serve
/// differently configured agents.
pub trait Toolbox: Send + Sync + 'static {
    /// Build the registry for one agent.
    fn tools(config: &serde_json::Value) -> Result<ToolRegistry, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase a string"
        }

        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn call(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            let text = input["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidInput("text must be a string".into()))?;
            Ok(json!(text.to_uppercase()))
        }
    }

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn object_safety() {
        _assert_send_sync::<Arc<dyn Tool>>();
        let _: Arc<dyn Tool> = Arc::new(Upper);
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let registry = ToolRegistry::new().with(Upper);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.schemas()[0].name, "upper");
        let out = registry.call("upper", json!({"text": "hi"})).await.unwrap();
        assert_eq!(out, json!("HI"));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn bad_input_is_reported() {
        let registry = ToolRegistry::new().with(Upper);
        let err = registry.call("upper", json!({"text": 3})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
