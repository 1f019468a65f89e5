//! End-to-end workflows: agents built by the component factory, run as
//! pipelines, torn down by closing the factory.

use async_trait::async_trait;
use futures::StreamExt;
use hive_agents::{BasicAgent, RetrievalAgent};
use hive_core::test_utils::MockModel;
use hive_core::{Agent, CancellationToken, Event, Memory, Message, ModelClient, ModelError, Role};
use hive_factory::{
    ComponentFactory, ConfigRecord, Credential, ModelSpec, ProviderConnector, ProviderRegistry,
    StaticCredentials,
};
use hive_memory::ListMemory;
use hive_orch::{GraphBuilder, Pipeline, PipelineState};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Hands out mock models and keeps them for inspection.
#[derive(Default)]
struct Recorder {
    built: Mutex<Vec<Arc<MockModel>>>,
}

impl Recorder {
    fn built(&self) -> Vec<Arc<MockModel>> {
        self.built.lock().unwrap().clone()
    }
}

struct Connector(Arc<Recorder>);

#[async_trait]
impl ProviderConnector for Connector {
    async fn connect(
        &self,
        spec: &ModelSpec,
        _credential: Option<Credential>,
    ) -> Result<Arc<dyn ModelClient>, ModelError> {
        let model = Arc::new(MockModel::new(&spec.provider, &spec.model));
        self.0.built.lock().unwrap().push(Arc::clone(&model));
        Ok(model)
    }
}

fn llm(extra: serde_json::Value) -> serde_json::Value {
    let mut config = json!({"provider": "openai", "model": "gpt-4o"});
    if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    config
}

fn factory(recorder: &Arc<Recorder>) -> ComponentFactory {
    let agents = ConfigRecord::new()
        .with_entry("writer", json!({"llm_config": llm(json!({}))}))
        .with_entry("editor1", json!({"llm_config": llm(json!({}))}))
        .with_entry("editor2", json!({"llm_config": llm(json!({}))}))
        .with_entry(
            "reviewer",
            json!({"llm_config": llm(json!({"temperature": 0.2}))}),
        )
        .with_entry("librarian", json!({"llm_config": llm(json!({}))}));
    let providers =
        ProviderRegistry::new().with_connector("openai", Connector(Arc::clone(recorder)));
    ComponentFactory::new(agents, providers).with_credentials(Arc::new(
        StaticCredentials::new().with("OPENAI_API_KEY", "sk-test"),
    ))
}

async fn agent(factory: &ComponentFactory, name: &str) -> Arc<dyn Agent> {
    let agent: BasicAgent = factory.create_agent(name, &[]).await.unwrap();
    Arc::new(agent)
}

async fn review_pipeline(factory: &ComponentFactory) -> Pipeline {
    let mut builder = GraphBuilder::new();
    for name in ["writer", "editor1", "editor2", "reviewer"] {
        builder.add_node(agent(factory, name).await).unwrap();
    }
    builder.add_edge("writer", "editor1").unwrap();
    builder.add_edge("writer", "editor2").unwrap();
    builder.add_edge("editor1", "reviewer").unwrap();
    builder.add_edge("editor2", "reviewer").unwrap();
    Pipeline::new("review", "write, edit twice, review", builder.build().unwrap())
}

#[tokio::test]
async fn review_workflow_shares_connections_and_closes_once() {
    let recorder = Arc::new(Recorder::default());
    let factory = factory(&recorder);
    let pipeline = review_pipeline(&factory).await;

    // writer and editors share one connection; reviewer's temperature is a
    // different key.
    assert_eq!(recorder.built().len(), 2);
    assert_eq!(factory.cached_models().await.len(), 2);

    let response = pipeline.run("T").await.unwrap();
    assert_eq!(response.chat_message.source, "reviewer");
    assert_eq!(response.trace().len(), 4);
    assert_eq!(pipeline.state(), PipelineState::Completed);

    let built = recorder.built();
    assert_eq!(built[0].requests().len(), 3);
    let review_requests = built[1].requests();
    let review_request = &review_requests[0];
    let named: Vec<Option<&str>> = review_request
        .messages
        .iter()
        .map(|turn| turn.name.as_deref())
        .collect();
    assert_eq!(named, vec![Some("user"), Some("editor1"), Some("editor2")]);
    assert!(review_request.messages.iter().all(|turn| turn.role == Role::User));

    // Agents leave their shared connections open; only teardown closes them.
    drop(pipeline);
    assert!(built.iter().all(|model| model.closes() == 0));

    factory.close().await.unwrap();
    factory.close().await.unwrap();
    assert!(built.iter().all(|model| model.closes() == 1));
}

#[tokio::test]
async fn review_workflow_streams_then_responds() {
    let recorder = Arc::new(Recorder::default());
    let factory = factory(&recorder);
    let pipeline = review_pipeline(&factory).await;

    let events: Vec<Event> = pipeline
        .run_stream("T", CancellationToken::new())
        .map(|e| e.unwrap())
        .collect()
        .await;
    assert_eq!(events.len(), 5);
    assert!(matches!(&events[0], Event::Message(m) if m.source == "writer"));
    assert!(matches!(&events[4], Event::Response(r) if r.chat_message.source == "reviewer"));
    factory.close().await.unwrap();
}

#[tokio::test]
async fn nested_review_feeds_a_retrieval_agent() {
    let recorder = Arc::new(Recorder::default());
    let factory = factory(&recorder);

    let notes = ListMemory::new("notes");
    notes
        .add("House style: short sentences.".into(), json!(null))
        .await
        .unwrap();
    let notes: Arc<dyn Memory> = Arc::new(notes);
    let notes = hive_core::Handle::new(hive_core::ResourceKey::memory("notes"), notes);
    let librarian: RetrievalAgent = factory
        .create_agent("librarian", &[notes])
        .await
        .unwrap();

    let review: Arc<dyn Agent> = Arc::new(review_pipeline(&factory).await);
    let mut builder = GraphBuilder::new();
    builder
        .add_node(review)
        .unwrap()
        .add_node(Arc::new(librarian))
        .unwrap();
    builder.add_edge("review", "librarian").unwrap();
    let outer = Pipeline::new("publish", "", builder.build().unwrap());

    let response = outer.run(vec![Message::user("T")]).await.unwrap();
    let trace = response.trace();
    let sources: Vec<&str> = trace
        .iter()
        .filter(|m| m.kind == hive_core::MessageKind::Text)
        .map(|m| match m.source.as_str() {
            "editor1" | "editor2" => "editor",
            other => other,
        })
        .collect();
    assert_eq!(
        sources,
        vec!["writer", "editor", "editor", "reviewer", "librarian"]
    );
    assert!(
        response
            .inner_messages
            .iter()
            .any(|m| m.source == "librarian" && m.content.contains("House style"))
    );
    factory.close().await.unwrap();
}
