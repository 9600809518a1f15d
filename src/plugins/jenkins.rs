//! Jenkins plugin
//!
//! Job names may contain folders (`team/service/build`); each folder is
//! mapped onto Jenkins' `job/<name>` URL scheme and sent as its own
//! percent-encoded path segment.

use super::{optional_str, optional_u64, required_str, Backend, BackendError, Plugin};
use crate::config::InstanceConfig;
use crate::models::{JsonObject, ResultShape, ToolDescriptor};
use crate::services::http_client::VendorHttpClient;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use serde_json::{json, Value};
use std::sync::Arc;

const JOB_TREE: &str = "jobs[name,fullName,url,color]";

pub fn plugin() -> Plugin {
    Plugin::new("jenkins", tools(), |instance: &InstanceConfig| {
        Ok(Arc::new(JenkinsClient::new(instance)?) as Arc<dyn Backend>)
    })
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::builder("list_jobs", "List Jenkins jobs, optionally inside a folder")
            .string("folder", "Folder path, segments separated by '/'", false)
            .returns(ResultShape::Array)
            .build(),
        ToolDescriptor::builder(
            "get_job_details",
            "Get details of a Jenkins job including its last builds and health",
        )
        .string("jobName", "Full job name, folders separated by '/'", true)
        .returns(ResultShape::Object)
        .build(),
        ToolDescriptor::builder("get_build", "Get one build of a job (latest by default)")
            .string("jobName", "Full job name, folders separated by '/'", true)
            .integer("buildNumber", "Build number; the last build when omitted", false)
            .returns(ResultShape::Object)
            .build(),
        ToolDescriptor::builder("get_build_log", "Get the console output of a build")
            .string("jobName", "Full job name, folders separated by '/'", true)
            .integer("buildNumber", "Build number; the last build when omitted", false)
            .integer("maxLines", "Only return the last N lines", false)
            .returns(ResultShape::Text)
            .build(),
        ToolDescriptor::builder("trigger_build", "Queue a new build of a job")
            .string("jobName", "Full job name, folders separated by '/'", true)
            .object("parameters", "Build parameters as name/value pairs", false)
            .returns(ResultShape::Object)
            .build(),
    ]
}

/// `team/service` -> `["job", "team", "job", "service"]`
fn job_segments(name: &str) -> Vec<&str> {
    name.split('/')
        .filter(|segment| !segment.is_empty())
        .flat_map(|segment| ["job", segment])
        .collect()
}

fn build_ref(arguments: &JsonObject) -> String {
    optional_u64(arguments, "buildNumber")
        .map(|n| n.to_string())
        .unwrap_or_else(|| "lastBuild".to_string())
}

fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

fn parameter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct JenkinsClient {
    http: VendorHttpClient,
}

impl JenkinsClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: VendorHttpClient::new(instance)?,
        })
    }

    async fn list_jobs(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let mut path = optional_str(arguments, "folder")
            .map(job_segments)
            .unwrap_or_default();
        path.extend(["api", "json"]);

        let body = self
            .http
            .get_json(&path, &[("tree", JOB_TREE.to_string())])
            .await?;
        Ok(body.get("jobs").cloned().unwrap_or_else(|| json!([])))
    }

    async fn get_job_details(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let mut path = job_segments(required_str(arguments, "jobName")?);
        path.extend(["api", "json"]);
        self.http.get_json(&path, &[]).await
    }

    async fn get_build(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let build = build_ref(arguments);
        let mut path = job_segments(required_str(arguments, "jobName")?);
        path.extend([build.as_str(), "api", "json"]);
        self.http.get_json(&path, &[]).await
    }

    async fn get_build_log(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let build = build_ref(arguments);
        let mut path = job_segments(required_str(arguments, "jobName")?);
        path.extend([build.as_str(), "consoleText"]);
        let log = self.http.get_text(&path, &[]).await?;

        let log = match optional_u64(arguments, "maxLines") {
            Some(max) => tail_lines(&log, max as usize),
            None => log,
        };
        Ok(Value::String(log))
    }

    async fn trigger_build(&self, arguments: &JsonObject) -> Result<Value, BackendError> {
        let job_name = required_str(arguments, "jobName")?;
        let mut path = job_segments(job_name);

        let parameters: Vec<(String, String)> = arguments
            .get("parameters")
            .and_then(Value::as_object)
            .map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), parameter_value(v)))
                    .collect()
            })
            .unwrap_or_default();

        let response = if parameters.is_empty() {
            path.push("build");
            self.http.post(&path, &[]).await?
        } else {
            path.push("buildWithParameters");
            let query: Vec<(&str, String)> = parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect();
            self.http.post(&path, &query).await?
        };

        let queue_url = response
            .headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(json!({
            "job": job_name,
            "queued": true,
            "status": response.status,
            "queueUrl": queue_url,
        }))
    }
}

#[async_trait]
impl Backend for JenkinsClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn invoke(&self, tool: &str, arguments: &JsonObject) -> Result<Value, BackendError> {
        match tool {
            "list_jobs" => self.list_jobs(arguments).await,
            "get_job_details" => self.get_job_details(arguments).await,
            "get_build" => self.get_build(arguments).await,
            "get_build_log" => self.get_build_log(arguments).await,
            "trigger_build" => self.trigger_build(arguments).await,
            other => Err(BackendError::Unsupported(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstancesConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> JenkinsClient {
        let text = json!({"instances": [
            {"name": "ci", "baseUrl": base_url, "username": "ci", "apiToken": "tok"}
        ]})
        .to_string();
        let config = InstancesConfig::from_json("test", &text).expect("valid config");
        JenkinsClient::new(&config.instances[0]).expect("client")
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_job_segments_handle_folders() {
        assert_eq!(job_segments("build"), vec!["job", "build"]);
        assert_eq!(job_segments("team/service/"), vec!["job", "team", "job", "service"]);
        assert!(job_segments("").is_empty());
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
    }

    #[tokio::test]
    async fn test_list_jobs_returns_job_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/team/api/json"))
            .and(query_param("tree", JOB_TREE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobs": [{"name": "build", "color": "blue"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let jobs = client(&server.uri())
            .invoke("list_jobs", &args(json!({"folder": "team"})))
            .await
            .expect("jobs");

        assert_eq!(jobs, json!([{"name": "build", "color": "blue"}]));
    }

    #[tokio::test]
    async fn test_get_build_defaults_to_last_build() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/app/lastBuild/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"number": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let build = client(&server.uri())
            .invoke("get_build", &args(json!({"jobName": "app"})))
            .await
            .expect("build");
        assert_eq!(build["number"], 7);
    }

    #[tokio::test]
    async fn test_get_build_log_tails_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/app/12/consoleText"))
            .respond_with(ResponseTemplate::new(200).set_body_string("one\ntwo\nthree\n"))
            .mount(&server)
            .await;

        let log = client(&server.uri())
            .invoke(
                "get_build_log",
                &args(json!({"jobName": "app", "buildNumber": 12, "maxLines": 2})),
            )
            .await
            .expect("log");
        assert_eq!(log, json!("two\nthree"));
    }

    #[tokio::test]
    async fn test_trigger_build_with_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/job/app/buildWithParameters"))
            .and(query_param("BRANCH", "main"))
            .and(query_param("DRY_RUN", "true"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "http://jenkins/queue/item/42/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let queued = client(&server.uri())
            .invoke(
                "trigger_build",
                &args(json!({"jobName": "app", "parameters": {"BRANCH": "main", "DRY_RUN": true}})),
            )
            .await
            .expect("queued");

        assert_eq!(queued["queued"], true);
        assert_eq!(queued["status"], 201);
        assert_eq!(queued["queueUrl"], "http://jenkins/queue/item/42/");
    }

    #[tokio::test]
    async fn test_job_name_with_reserved_characters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/release%20%231%3Fbeta/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "release #1?beta"})))
            .expect(1)
            .mount(&server)
            .await;

        let job = client(&server.uri())
            .invoke("get_job_details", &args(json!({"jobName": "release #1?beta"})))
            .await
            .expect("job");
        assert_eq!(job["name"], "release #1?beta");
    }

    #[tokio::test]
    async fn test_unknown_capability() {
        let err = client("http://127.0.0.1:9")
            .invoke("delete_everything", &JsonObject::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unsupported(_)));
    }
}
