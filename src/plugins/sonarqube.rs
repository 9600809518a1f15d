//! SonarQube plugin

use super::{optional_str, optional_u64, project_key_argument, required_str, Backend, BackendError, Plugin};
use crate::config::InstanceConfig;
use crate::models::{JsonObject, ResultShape, ToolDescriptor};
use crate::services::http_client::VendorHttpClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_METRICS: &str = "bugs,vulnerabilities,code_smells,coverage,duplicated_lines_density";
const DEFAULT_PAGE_SIZE: u64 = 100;

pub fn plugin() -> Plugin {
    Plugin::new("sonarqube", tools(), |instance: &InstanceConfig| {
        Ok(Arc::new(SonarQubeClient::new(instance)?) as Arc<dyn Backend>)
    })
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::builder(
            "get_quality_gate_status",
            "Quality gate status of a project",
        )
        .string("projectKey", "SonarQube project key", true)
        .returns(ResultShape::Object)
        .target(project_key_argument)
        .build(),
        ToolDescriptor::builder("get_measures", "Metric values of a project")
            .string("projectKey", "SonarQube project key", true)
            .string("metricKeys", "Comma separated metric keys", false)
            .returns(ResultShape::Object)
            .target(project_key_argument)
            .build(),
        ToolDescriptor::builder("search_issues", "Open issues of a project")
            .string("projectKey", "SonarQube project key", true)
            .string("severities", "Comma separated severities, e.g. BLOCKER,CRITICAL", false)
            .integer("pageSize", "Maximum number of issues (default 100)", false)
            .returns(ResultShape::Object)
            .target(project_key_argument)
            .build(),
    ]
}

pub struct SonarQubeClient {
    http: VendorHttpClient,
}

impl SonarQubeClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: VendorHttpClient::new(instance)?,
        })
    }

    async fn get_quality_gate_status(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let project_key = required_str(arguments, "projectKey")?;
        let body = self
            .http
            .get_json(
                &["api", "qualitygates", "project_status"],
                &[("projectKey", project_key.to_string())],
            )
            .await?;
        Ok(body.get("projectStatus").cloned().unwrap_or(body))
    }

    async fn get_measures(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let project_key = required_str(arguments, "projectKey")?;
        let metrics = optional_str(arguments, "metricKeys").unwrap_or(DEFAULT_METRICS);
        let body = self
            .http
            .get_json(
                &["api", "measures", "component"],
                &[
                    ("component", project_key.to_string()),
                    ("metricKeys", metrics.to_string()),
                ],
            )
            .await?;
        Ok(body.get("component").cloned().unwrap_or(body))
    }

    async fn search_issues(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let project_key = required_str(arguments, "projectKey")?;
        let page_size = optional_u64(arguments, "pageSize").unwrap_or(DEFAULT_PAGE_SIZE);

        let mut query = vec![
            ("componentKeys", project_key.to_string()),
            ("resolved", "false".to_string()),
            ("ps", page_size.to_string()),
        ];
        if let Some(severities) = optional_str(arguments, "severities") {
            query.push(("severities", severities.to_string()));
        }

        let body = self.http.get_json(&["api", "issues", "search"], &query).await?;
        Ok(json!({
            "total": body.get("total").cloned().unwrap_or(Value::Null),
            "issues": body.get("issues").cloned().unwrap_or_else(|| json!([])),
        }))
    }
}

#[async_trait]
impl Backend for SonarQubeClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn invoke(&self, tool: &str, arguments: &JsonObject) -> Result<Value, BackendError> {
        match tool {
            "get_quality_gate_status" => self.get_quality_gate_status(arguments).await,
            "get_measures" => self.get_measures(arguments).await,
            "search_issues" => self.search_issues(arguments).await,
            other => Err(BackendError::Unsupported(other.to_string())),
        }
    }
}
