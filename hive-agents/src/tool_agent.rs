//! Tool-using agent: model + tools in a bounded loop.

use crate::prompt::{Profile, complete, to_chat_turns};
use crate::tool::{ToolRegistry, Toolbox};
use async_trait::async_trait;
use hive_core::{
    Agent, AgentError, CancellationToken, ChatTurn, CompletionRequest, Event, EventStream,
    Message, ModelHandle, Response, final_response,
};
use hive_factory::{AgentInit, AgentKind};
use std::marker::PhantomData;

/// Iterations allowed when `tool_config.max_iterations` is not set.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// A model-backed agent that may call tools before answering.
///
/// Each iteration sends the conversation so far with the tool schemas. When
/// the model requests tool calls they are executed in order and their
/// results appended; when it answers with text the loop ends. Tool calls and
/// results are streamed as event messages while they happen.
///
/// An unknown tool or a failing tool does not fail the agent: the error text
/// is returned to the model as the tool result. When the iteration budget is
/// exhausted the answer summarizes the last tool results.
pub struct ToolAgent<T: Toolbox> {
    profile: Profile,
    client: ModelHandle,
    tools: ToolRegistry,
    max_iterations: usize,
    _toolbox: PhantomData<fn() -> T>,
}

impl<T: Toolbox> ToolAgent<T> {
    /// Tools this agent offers to the model.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Model round-trips allowed per invocation.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

fn render_result(result: serde_json::Value) -> String {
    match result {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[async_trait]
impl<T: Toolbox> Agent for ToolAgent<T> {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn description(&self) -> &str {
        &self.profile.description
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        final_response(self.respond_stream(messages, cancel)).await
    }

    fn respond_stream<'a>(
        &'a self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        Box::pin(async_stream::try_stream! {
            let name = self.profile.name.clone();
            let schemas = self.tools.schemas();
            let mut turns = to_chat_turns(&name, &messages);
            let mut inner: Vec<Message> = Vec::new();
            let mut last_results: Vec<String> = Vec::new();
            let mut answer = None;

            for iteration in 0..self.max_iterations {
                let request = CompletionRequest {
                    system: Some(self.profile.instructions.clone()),
                    messages: turns.clone(),
                    tools: schemas.clone(),
                    ..CompletionRequest::default()
                };
                tracing::debug!(agent = %name, iteration, "hive.agent.complete");
                let completion = match complete(&self.client, request, &cancel).await {
                    Err(AgentError::Cancelled { .. }) => {
                        Err(AgentError::Cancelled { trace: inner.clone() })?
                    }
                    other => other?,
                };

                if let Some(thought) = completion.thought {
                    let message = Message::thought(name.clone(), thought);
                    inner.push(message.clone());
                    yield Event::Message(message);
                }

                if completion.tool_calls.is_empty() {
                    answer = Some(completion.text);
                    break;
                }

                turns.push(ChatTurn::tool_request(
                    Some(name.clone()),
                    completion.text,
                    completion.tool_calls.clone(),
                ));
                last_results.clear();

                for call in completion.tool_calls {
                    if cancel.is_cancelled() {
                        Err::<(), _>(AgentError::Cancelled { trace: inner.clone() })?;
                    }
                    let request_event =
                        Message::event(name.clone(), format!("calling {} with {}", call.name, call.input));
                    inner.push(request_event.clone());
                    yield Event::Message(request_event);

                    tracing::debug!(agent = %name, tool = %call.name, "hive.tool.pre_execution");
                    let content = match self.tools.call(&call.name, call.input.clone()).await {
                        Ok(value) => render_result(value),
                        Err(err) => {
                            tracing::warn!(agent = %name, tool = %call.name, error = %err, "hive.tool.failed");
                            format!("Error: {err}")
                        }
                    };

                    let result_event =
                        Message::event(name.clone(), format!("{} returned: {}", call.name, content));
                    inner.push(result_event.clone());
                    yield Event::Message(result_event);

                    turns.push(ChatTurn::tool_result(&call, content.clone()));
                    last_results.push(content);
                }
            }

            let text = match answer {
                Some(text) => text,
                None => {
                    tracing::warn!(
                        agent = %name,
                        max_iterations = self.max_iterations,
                        "hive.agent.max_iterations"
                    );
                    last_results.join("\n")
                }
            };
            yield Event::Response(Response::new(Message::text(name, text)).with_inner(inner));
        })
    }
}

impl<T: Toolbox> AgentKind for ToolAgent<T> {
    fn initialize(init: AgentInit) -> Result<Self, AgentError> {
        let tool_config = &init.config.tool_config;
        let max_iterations = match tool_config.get("max_iterations") {
            None | Some(serde_json::Value::Null) => DEFAULT_MAX_ITERATIONS,
            Some(value) => value
                .as_u64()
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| {
                    AgentError::InvalidInput(format!(
                        "tool_config.max_iterations must be a positive integer, got {value}"
                    ))
                })?,
        };
        let tools = T::tools(tool_config).map_err(|e| AgentError::InvalidInput(e.to_string()))?;
        Ok(Self {
            profile: Profile::from_init(&init),
            client: init.client,
            tools,
            max_iterations,
            _toolbox: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{init_with, mock_init};
    use crate::tool::{Tool, ToolError};
    use futures::StreamExt;
    use hive_core::test_utils::MockModel;
    use hive_core::{Completion, MessageKind, Role, ToolCall};
    use serde_json::json;
    use std::sync::Arc;

    struct Weather;

    #[async_trait]
    impl Tool for Weather {
        fn name(&self) -> &str {
            "get_weather"
        }

        fn description(&self) -> &str {
            "Current weather for a city"
        }

        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"city": {"type": "string"}}})
        }

        async fn call(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            match input["city"].as_str() {
                Some("Atlantis") => Err(ToolError::ExecutionFailed("no such city".into())),
                Some(city) => Ok(json!(format!("Sunny in {city}"))),
                None => Err(ToolError::InvalidInput("city required".into())),
            }
        }
    }

    struct WeatherTools;

    impl Toolbox for WeatherTools {
        fn tools(_config: &serde_json::Value) -> Result<ToolRegistry, ToolError> {
            Ok(ToolRegistry::new().with(Weather))
        }
    }

    fn call(id: &str, name: &str, input: serde_json::Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    #[tokio::test]
    async fn runs_tools_then_answers() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o").with_responses(vec![
            Completion::tool_calls(vec![call("c1", "get_weather", json!({"city": "Paris"}))]),
            Completion::text("It is sunny in Paris."),
        ]));
        let agent: ToolAgent<WeatherTools> =
            ToolAgent::initialize(mock_init("weather", Arc::clone(&model))).unwrap();

        let response = agent
            .respond(vec![Message::user("weather in Paris?")], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.chat_message.content, "It is sunny in Paris.");
        assert_eq!(response.inner_messages.len(), 2);
        assert!(response.inner_messages.iter().all(|m| m.kind == MessageKind::Event));
        assert!(response.inner_messages[1].content.contains("Sunny in Paris"));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        let followup = &requests[1].messages;
        assert_eq!(followup[1].role, Role::Assistant);
        assert_eq!(followup[1].tool_calls.len(), 1);
        assert_eq!(followup[2].role, Role::Tool);
        assert_eq!(followup[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(followup[2].content, "Sunny in Paris");
    }

    #[tokio::test]
    async fn streams_tool_events_before_the_response() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o").with_responses(vec![
            Completion::tool_calls(vec![call("c1", "get_weather", json!({"city": "Oslo"}))]),
            Completion::text("done"),
        ]));
        let agent: ToolAgent<WeatherTools> =
            ToolAgent::initialize(mock_init("weather", model)).unwrap();

        let events: Vec<Event> = agent
            .respond_stream(vec![Message::user("q")], CancellationToken::new())
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::Message(m) if m.content.starts_with("calling get_weather")));
        assert!(matches!(&events[1], Event::Message(m) if m.content.contains("Sunny in Oslo")));
        assert!(matches!(&events[2], Event::Response(r) if r.chat_message.content == "done"));
    }

    #[tokio::test]
    async fn tool_failures_are_fed_back_to_the_model() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o").with_responses(vec![
            Completion::tool_calls(vec![
                call("c1", "get_weather", json!({"city": "Atlantis"})),
                call("c2", "launch_rocket", json!({})),
            ]),
            Completion::text("sorry"),
        ]));
        let agent: ToolAgent<WeatherTools> =
            ToolAgent::initialize(mock_init("weather", Arc::clone(&model))).unwrap();

        let response = agent
            .respond(vec![Message::user("q")], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.chat_message.content, "sorry");

        let followup = &model.requests()[1].messages;
        assert!(followup[2].content.contains("no such city"));
        assert!(followup[3].content.contains("tool not found: launch_rocket"));
    }

    #[tokio::test]
    async fn exhausted_budget_summarizes_last_results() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o").with_responses(vec![
            Completion::tool_calls(vec![call("c1", "get_weather", json!({"city": "Rome"}))]),
            Completion::tool_calls(vec![
                call("c2", "get_weather", json!({"city": "Lima"})),
                call("c3", "get_weather", json!({"city": "Kyiv"})),
            ]),
        ]));
        let init = init_with("weather", Arc::clone(&model), |config| {
            config.tool_config = json!({"max_iterations": 2});
        });
        let agent: ToolAgent<WeatherTools> = ToolAgent::initialize(init).unwrap();
        assert_eq!(agent.max_iterations(), 2);

        let response = agent
            .respond(vec![Message::user("q")], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.chat_message.content, "Sunny in Lima\nSunny in Kyiv");
        assert_eq!(model.requests().len(), 2);
    }

    #[test]
    fn rejects_invalid_iteration_budget() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o"));
        let init = init_with("weather", model, |config| {
            config.tool_config = json!({"max_iterations": 0});
        });
        let result: Result<ToolAgent<WeatherTools>, _> = ToolAgent::initialize(init);
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }

    #[test]
    fn defaults_to_five_iterations() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o"));
        let agent: ToolAgent<WeatherTools> =
            ToolAgent::initialize(mock_init("weather", model)).unwrap();
        assert_eq!(agent.max_iterations(), DEFAULT_MAX_ITERATIONS);
        assert_eq!(agent.tools().len(), 1);
    }
}
