//! Shared fixtures for unit and integration tests
//!
//! A `stub` plugin with three tools and a scripted backend that records
//! every connection and invocation, so tests can assert both what a
//! surface returned and whether the backend was touched at all.

use crate::config::{InstanceConfig, InstancesConfig};
use crate::models::{JsonObject, ResultShape, ToolDescriptor};
use crate::plugins::{project_key_argument, Backend, BackendError, Plugin};
use crate::AppState;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the stub backend answers with
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Reports the serving instance and the received arguments
    Echo,
    Fail(String),
    Data(Value),
    Panic,
}

/// Record of what reached the stub backend
#[derive(Debug, Default)]
pub struct CallLog {
    connections: AtomicUsize,
    invocations: AtomicUsize,
    served_by: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Instance names in invocation order
    pub fn served_by(&self) -> Vec<String> {
        self.served_by
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

struct StubBackend {
    instance: String,
    base_url: String,
    behavior: StubBehavior,
    log: Arc<CallLog>,
}

#[async_trait]
impl Backend for StubBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn invoke(&self, tool: &str, arguments: &JsonObject) -> Result<Value, BackendError> {
        self.log.invocations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut names) = self.log.served_by.lock() {
            names.push(self.instance.clone());
        }

        match &self.behavior {
            StubBehavior::Echo if tool == "list_jobs" => {
                Ok(json!([{ "name": "build-app", "instance": self.instance }]))
            }
            StubBehavior::Echo => Ok(json!({
                "tool": tool,
                "instance": self.instance,
                "arguments": arguments,
            })),
            StubBehavior::Fail(message) => Err(BackendError::Client(message.clone())),
            StubBehavior::Data(data) => Ok(data.clone()),
            StubBehavior::Panic => panic!("stub backend panicked"),
        }
    }
}

pub fn stub_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::builder("list_jobs", "List all jobs")
            .string("folder", "Optional folder", false)
            .returns(ResultShape::Array)
            .build(),
        ToolDescriptor::builder("echo", "Echo the arguments back")
            .string("text", "Text to echo", false)
            .returns(ResultShape::Object)
            .build(),
        ToolDescriptor::builder("get_project", "Get one project")
            .string("projectKey", "Project key", true)
            .returns(ResultShape::Any)
            .target(project_key_argument)
            .build(),
    ]
}

pub fn stub_plugin(behavior: StubBehavior, log: Arc<CallLog>) -> Plugin {
    Plugin::new("stub", stub_tools(), move |instance: &InstanceConfig| {
        log.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubBackend {
            instance: instance.name.clone(),
            base_url: instance.base_url.clone(),
            behavior: behavior.clone(),
            log: Arc::clone(&log),
        }) as Arc<dyn Backend>)
    })
}

/// `prod` (default), `staging`, and `team` restricted to project ABC
pub fn sample_instances_json() -> String {
    json!({
        "instances": [
            {"name": "prod", "baseUrl": "https://prod.example.com", "username": "bot", "apiToken": "p"},
            {"name": "staging", "baseUrl": "https://staging.example.com", "apiToken": "s"},
            {
                "name": "team",
                "baseUrl": "https://team.example.com",
                "apiToken": "t",
                "allowedProjectKey": "ABC"
            }
        ]
    })
    .to_string()
}

pub fn sample_instances() -> InstancesConfig {
    InstancesConfig::from_json("sample", &sample_instances_json())
        .expect("sample config is valid")
}

/// Application state over the stub plugin and the sample instances
pub fn stub_state(behavior: StubBehavior) -> (AppState, Arc<CallLog>) {
    let log = Arc::new(CallLog::default());
    let plugin = stub_plugin(behavior, Arc::clone(&log));
    let state = AppState::build(&plugin, sample_instances()).expect("stub state builds");
    (state, log)
}

/// Full router (REST, `/mcp`, SSE) over [`stub_state`]
///
/// Must be called inside a tokio runtime; the SSE endpoint spawns its
/// session task on creation.
pub fn stub_router(behavior: StubBehavior) -> (axum::Router, Arc<CallLog>) {
    let (state, log) = stub_state(behavior);
    let sse = crate::mcp::SseEndpoint::new(state.mcp_service.clone());
    (crate::routes::build_router(state, &sse), log)
}

/// Collects a response body and parses it as JSON
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
