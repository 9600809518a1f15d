//! Tool dispatcher
//!
//! Turns one `(tool, arguments)` call into exactly one backend invocation
//! and one [`ToolCallResult`]. Used unchanged by every surface of the
//! protocol bridge.

use crate::error::DispatchError;
use crate::mcp::registry::{InstanceHandle, InstanceRegistry};
use crate::models::{JsonObject, ToolCallResult, ToolDescriptor, INSTANCE_ARGUMENT};
use crate::services::catalogue::Catalogue;
use crate::services::validation::validate_arguments;
use serde_json::Value;
use std::sync::Arc;

pub struct Dispatcher {
    catalogue: Arc<Catalogue>,
    registry: Arc<InstanceRegistry>,
}

impl Dispatcher {
    pub fn new(catalogue: Arc<Catalogue>, registry: Arc<InstanceRegistry>) -> Self {
        Self {
            catalogue,
            registry,
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Runs one tool call
    ///
    /// Never fails: every problem is reported inside the returned result.
    pub async fn dispatch(&self, tool_name: &str, arguments: Option<JsonObject>) -> ToolCallResult {
        match self.try_dispatch(tool_name, arguments.unwrap_or_default()).await {
            Ok(result) => {
                tracing::info!(tool = %tool_name, "Tool call succeeded");
                result
            }
            Err(err) => {
                tracing::warn!(tool = %tool_name, error = %err, "Tool call failed");
                err.into()
            }
        }
    }

    async fn try_dispatch(
        &self,
        tool_name: &str,
        mut arguments: JsonObject,
    ) -> Result<ToolCallResult, DispatchError> {
        let descriptor = self
            .catalogue
            .find(tool_name)
            .ok_or_else(|| DispatchError::UnknownTool(tool_name.to_string()))?;

        validate_arguments(descriptor, &arguments)?;

        let selector = match arguments.remove(INSTANCE_ARGUMENT) {
            Some(Value::String(name)) => Some(name),
            _ => None,
        };
        let instance = self.registry.resolve(selector.as_deref())?;

        enforce_restriction(descriptor, &instance, &arguments)?;

        tracing::debug!(
            tool = %tool_name,
            instance = %instance.name(),
            "Dispatching tool call"
        );

        let client = instance.client().await?;
        let data = client.invoke(tool_name, &arguments).await?;

        let shape = descriptor.result_shape();
        if !shape.accepts(&data) {
            return Err(DispatchError::UnexpectedResult(format!(
                "expected {} from {}",
                shape.as_str(),
                tool_name
            )));
        }

        Ok(ToolCallResult::from_data(shape, data))
    }
}

/// Checks the call against the instance's restriction, if any
///
/// Tools without a target are not affected. A targeted tool whose target
/// cannot be determined is denied.
fn enforce_restriction(
    descriptor: &ToolDescriptor,
    instance: &InstanceHandle,
    arguments: &JsonObject,
) -> Result<(), DispatchError> {
    let Some(restriction) = instance.restriction() else {
        return Ok(());
    };
    if !descriptor.has_target() {
        return Ok(());
    }

    match descriptor.target(arguments) {
        Some(target) if restriction.permits(&target) => Ok(()),
        Some(target) => Err(DispatchError::AccessDenied(format!(
            "project '{}' is outside the {}",
            target, restriction
        ))),
        None => Err(DispatchError::AccessDenied(format!(
            "target project could not be determined ({})",
            restriction
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InstanceConfig, InstancesConfig};
    use crate::models::ResultShape;
    use crate::plugins::{project_key_argument, Backend, BackendError, MockBackend, Plugin};
    use serde_json::json;

    fn tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::builder("list_jobs", "List jobs")
                .returns(ResultShape::Array)
                .build(),
            ToolDescriptor::builder("get_project", "Get a project")
                .string("projectKey", "Project key", true)
                .returns(ResultShape::Object)
                .target(project_key_argument)
                .build(),
        ]
    }

    fn dispatcher(mock: MockBackend, instances: serde_json::Value) -> Dispatcher {
        let backend: Arc<dyn Backend> = Arc::new(mock);
        let plugin = Plugin::new("test", tools(), move |_instance: &InstanceConfig| {
            Ok(Arc::clone(&backend))
        });
        let text = json!({ "instances": instances }).to_string();
        let config = InstancesConfig::from_json("test", &text).expect("valid config");
        let registry = InstanceRegistry::new(&plugin, config).expect("registry");
        let catalogue = Catalogue::new(plugin.tools().to_vec()).expect("catalogue");
        Dispatcher::new(Arc::new(catalogue), Arc::new(registry))
    }

    fn single() -> serde_json::Value {
        json!([{"name": "prod", "baseUrl": "http://prod.example", "apiToken": "t"}])
    }

    fn restricted() -> serde_json::Value {
        json!([{
            "name": "team",
            "baseUrl": "http://team.example",
            "apiToken": "t",
            "allowedProjectKey": "ABC"
        }])
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(0);
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher.dispatch("nope", None).await;
        assert_eq!(result.message(), Some("unknown tool: nope"));
    }

    #[tokio::test]
    async fn test_missing_field_never_reaches_backend() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(0);
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher.dispatch("get_project", args(json!({}))).await;
        assert!(result.is_error());
        assert!(result.message().unwrap_or_default().contains("'projectKey'"));
    }

    #[tokio::test]
    async fn test_success_strips_instance_argument() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(1).returning(|tool, arguments| {
            let seen = (tool.to_string(), arguments.contains_key("instance"));
            Box::pin(async move {
                assert_eq!(seen, ("list_jobs".to_string(), false));
                Ok(json!([{"name": "app"}]))
            })
        });
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher
            .dispatch("list_jobs", args(json!({"instance": "prod"})))
            .await;
        assert!(!result.is_error(), "{:?}", result.message());
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(0);
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher
            .dispatch("list_jobs", args(json!({"instance": "staging"})))
            .await;
        assert_eq!(result.message(), Some("unknown instance: staging"));
    }

    #[tokio::test]
    async fn test_restriction_permits_allowed_project() {
        let mut mock = MockBackend::new();
        mock.expect_invoke()
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(json!({"key": "ABC"})) }));
        let dispatcher = dispatcher(mock, restricted());

        let result = dispatcher
            .dispatch("get_project", args(json!({"projectKey": "abc"})))
            .await;
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_restriction_denies_other_project() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(0);
        let dispatcher = dispatcher(mock, restricted());

        let result = dispatcher
            .dispatch(
                "get_project",
                args(json!({"projectKey": "XYZ", "instance": "team"})),
            )
            .await;
        let message = result.message().unwrap_or_default();
        assert!(message.starts_with("access denied for this instance"), "{}", message);
    }

    #[tokio::test]
    async fn test_untargeted_tool_ignores_restriction() {
        let mut mock = MockBackend::new();
        mock.expect_invoke()
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(json!([])) }));
        let dispatcher = dispatcher(mock, restricted());

        assert!(!dispatcher.dispatch("list_jobs", None).await.is_error());
    }

    #[tokio::test]
    async fn test_backend_failure_message_is_kept() {
        let mut mock = MockBackend::new();
        mock.expect_invoke().times(1).returning(|_, _| {
            Box::pin(async move {
                Err(BackendError::Status {
                    url: "http://prod.example/api/json".to_string(),
                    status: 503,
                    body: "down".to_string(),
                })
            })
        });
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher.dispatch("list_jobs", None).await;
        assert!(result.message().unwrap_or_default().contains("503"));
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_reported() {
        let mut mock = MockBackend::new();
        mock.expect_invoke()
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(json!({"not": "a list"})) }));
        let dispatcher = dispatcher(mock, single());

        let result = dispatcher.dispatch("list_jobs", None).await;
        assert!(result
            .message()
            .unwrap_or_default()
            .starts_with("unexpected response from backend"));
    }
}
