//! In-memory implementations for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that prove the trait APIs are usable and let workflow
//! tests run without a provider.

mod echo_agent;
mod failing_agent;
mod mock_model;
mod scripted_agent;

pub use echo_agent::EchoAgent;
pub use failing_agent::FailingAgent;
pub use mock_model::MockModel;
pub use scripted_agent::ScriptedAgent;
