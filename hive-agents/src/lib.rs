#![deny(missing_docs)]
//! Model-backed agent variants for hive.
//!
//! Every variant implements [`hive_core::Agent`] and
//! [`hive_factory::AgentKind`], so the component factory builds them from a
//! named configuration and a shared model connection:
//!
//! | Variant | Behavior |
//! |---------|----------|
//! | [`BasicAgent`] | one completion, no tools |
//! | [`ToolAgent`] | completion/tool loop over a [`Toolbox`] |
//! | [`RetrievalAgent`] | memory lookup, then one completion |
//! | [`AssistantAgent`] | provider-hosted assistant with a persistent thread |
//!
//! Agents never open connections themselves and never close the handles
//! they hold; the factory owns both.

mod assistant;
mod basic;
mod prompt;
mod retrieval;
mod tool;
mod tool_agent;

pub use assistant::AssistantAgent;
pub use basic::BasicAgent;
pub use prompt::DEFAULT_INSTRUCTIONS;
pub use retrieval::RetrievalAgent;
pub use tool::{Tool, ToolError, ToolRegistry, Toolbox};
pub use tool_agent::{DEFAULT_MAX_ITERATIONS, ToolAgent};

#[cfg(test)]
mod test_support {
    use hive_core::test_utils::MockModel;
    use hive_core::{Handle, ModelClient, ResourceKey};
    use hive_factory::{AgentConfig, AgentInit, ModelSpec};
    use std::sync::Arc;

    pub fn mock_init(name: &str, model: Arc<MockModel>) -> AgentInit {
        init_with(name, model, |_| {})
    }

    pub fn init_with(
        name: &str,
        model: Arc<MockModel>,
        configure: impl FnOnce(&mut AgentConfig),
    ) -> AgentInit {
        let spec = ModelSpec::new(model.provider(), model.model());
        let key = ResourceKey::model(spec.provider.clone(), Some(spec.model.clone()), &spec.params);
        let mut config = AgentConfig::new(spec);
        configure(&mut config);
        let client: Arc<dyn ModelClient> = model;
        AgentInit {
            name: name.to_owned(),
            config,
            client: Handle::new(key, client),
            memory: vec![],
        }
    }
}
