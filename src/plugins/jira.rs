//! Jira plugin
//!
//! Every tool targets a project, so instances with an
//! `allowedProjectKey` are confined to that project. Free-form JQL is
//! AND-ed with the project clause as one parenthesized group; JQL whose
//! parentheses or quotes do not balance is rejected before any request,
//! since it could close that group early.

use super::{
    issue_key_project, optional_str, optional_u64, project_key_argument, required_str, Backend,
    BackendError, Plugin,
};
use crate::config::InstanceConfig;
use crate::models::{JsonObject, ResultShape, ToolDescriptor};
use crate::services::http_client::VendorHttpClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_MAX_RESULTS: u64 = 50;
const SEARCH_FIELDS: &str = "summary,status,assignee,priority,issuetype,updated";

pub fn plugin() -> Plugin {
    Plugin::new("jira", tools(), |instance: &InstanceConfig| {
        Ok(Arc::new(JiraClient::new(instance)?) as Arc<dyn Backend>)
    })
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::builder("search_issues", "Search issues of a project with optional JQL")
            .string("projectKey", "Project key, e.g. ABC", true)
            .string("jql", "Additional JQL, combined with the project clause", false)
            .integer("maxResults", "Maximum number of issues (default 50)", false)
            .returns(ResultShape::Object)
            .target(project_key_argument)
            .build(),
        ToolDescriptor::builder("get_issue", "Get one issue by key")
            .string("issueKey", "Issue key, e.g. ABC-123", true)
            .returns(ResultShape::Object)
            .target(issue_key_project)
            .build(),
        ToolDescriptor::builder("get_issue_comments", "List the comments of an issue")
            .string("issueKey", "Issue key, e.g. ABC-123", true)
            .returns(ResultShape::Array)
            .target(issue_key_project)
            .build(),
    ]
}

fn search_jql(project_key: &str, jql: Option<&str>) -> Result<String, BackendError> {
    let project = format!("project = \"{}\"", project_key.replace('"', ""));
    match jql {
        Some(extra) => {
            check_jql_grouping(extra)?;
            Ok(format!("{} AND ({})", project, extra))
        }
        None => Ok(format!("{} ORDER BY updated DESC", project)),
    }
}

/// Parentheses outside string literals must balance and never close more
/// than was opened; string literals must be terminated.
fn check_jql_grouping(jql: &str) -> Result<(), BackendError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = jql.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    BackendError::Client("jql closes a parenthesis it never opened".to_string())
                })?;
            }
            (None, _) => {}
        }
    }

    if quote.is_some() {
        return Err(BackendError::Client("jql has an unterminated string".to_string()));
    }
    if depth != 0 {
        return Err(BackendError::Client("jql has unbalanced parentheses".to_string()));
    }
    Ok(())
}

pub struct JiraClient {
    http: VendorHttpClient,
}

impl JiraClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: VendorHttpClient::new(instance)?,
        })
    }

    async fn search_issues(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let project_key = required_str(arguments, "projectKey")?;
        let jql = search_jql(project_key, optional_str(arguments, "jql"))?;
        let max_results = optional_u64(arguments, "maxResults").unwrap_or(DEFAULT_MAX_RESULTS);

        self.http
            .get_json(
                &["rest", "api", "2", "search"],
                &[
                    ("jql", jql),
                    ("maxResults", max_results.to_string()),
                    ("fields", SEARCH_FIELDS.to_string()),
                ],
            )
            .await
    }

    async fn get_issue(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let key = required_str(arguments, "issueKey")?;
        self.http
            .get_json(&["rest", "api", "2", "issue", key.trim()], &[])
            .await
    }

    async fn get_issue_comments(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let key = required_str(arguments, "issueKey")?;
        let body = self
            .http
            .get_json(&["rest", "api", "2", "issue", key.trim(), "comment"], &[])
            .await?;
        Ok(body.get("comments").cloned().unwrap_or_else(|| json!([])))
    }
}

#[async_trait]
impl Backend for JiraClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn invoke(&self, tool: &str, arguments: &JsonObject) -> Result<Value, BackendError> {
        match tool {
            "search_issues" => self.search_issues(arguments).await,
            "get_issue" => self.get_issue(arguments).await,
            "get_issue_comments" => self.get_issue_comments(arguments).await,
            other => Err(BackendError::Unsupported(other.to_string())),
        }
    }
}
