//! Tool descriptors
//!
//! A [`ToolDescriptor`] is the declarative half of a tool: its name, the
//! human description and the JSON Schema of its arguments. The executable
//! half lives in the vendor backend. Descriptors are built once per process
//! with [`ToolDescriptor::builder`] and never change afterwards.
//!
//! ```rust
//! use toolgate::models::tool::{ResultShape, ToolDescriptor};
//!
//! let tool = ToolDescriptor::builder("get_job_details", "Details of one Jenkins job")
//!     .string("jobName", "Full job name, folders separated by '/'", true)
//!     .returns(ResultShape::Object)
//!     .build();
//!
//! assert_eq!(tool.required_fields(), vec!["jobName"]);
//! ```

use serde_json::{json, Value};
use std::sync::Arc;

/// JSON object as used for tool arguments and schemas
pub type JsonObject = serde_json::Map<String, Value>;

/// Extracts the target (a project key) a call would touch
pub type TargetExtractor = fn(&JsonObject) -> Option<String>;

/// Name of the optional argument selecting the instance
pub const INSTANCE_ARGUMENT: &str = "instance";

/// Loose result schema checked before backend data is handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Object,
    Array,
    Text,
    Any,
}

impl ResultShape {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ResultShape::Object => value.is_object(),
            ResultShape::Array => value.is_array(),
            ResultShape::Text => value.is_string(),
            ResultShape::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultShape::Object => "object",
            ResultShape::Array => "array",
            ResultShape::Text => "text",
            ResultShape::Any => "any",
        }
    }
}

#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Arc<JsonObject>,
    result_shape: ResultShape,
    target: Option<TargetExtractor>,
}

impl ToolDescriptor {
    pub fn builder(name: &str, description: &str) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            name: name.to_string(),
            description: description.to_string(),
            properties: JsonObject::new(),
            required: Vec::new(),
            result_shape: ResultShape::Any,
            target: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &JsonObject {
        &self.input_schema
    }

    pub fn result_shape(&self) -> ResultShape {
        self.result_shape
    }

    /// True when the tool declares a restricted target
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self, arguments: &JsonObject) -> Option<String> {
        self.target.and_then(|extract| extract(arguments))
    }

    pub fn properties(&self) -> Option<&JsonObject> {
        self.input_schema.get("properties").and_then(Value::as_object)
    }

    /// JSON Schema type of a declared property
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties()?
            .get(name)?
            .get("type")
            .and_then(Value::as_str)
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// True when the schema lets callers pick an instance
    pub fn accepts_instance(&self) -> bool {
        self.properties()
            .map(|props| props.contains_key(INSTANCE_ARGUMENT))
            .unwrap_or(false)
    }

    /// Adds the optional `instance` selector unless already declared
    pub(crate) fn with_instance_selector(mut self) -> Self {
        if self.accepts_instance() {
            return self;
        }

        let mut schema = (*self.input_schema).clone();
        if let Some(Value::Object(props)) = schema.get_mut("properties") {
            props.insert(
                INSTANCE_ARGUMENT.to_string(),
                json!({
                    "type": "string",
                    "description": "Name of the configured instance to use (defaults to the first one)"
                }),
            );
        }
        self.input_schema = Arc::new(schema);
        self
    }

    /// MCP wire form of this descriptor
    pub fn to_mcp_tool(&self) -> rmcp::model::Tool {
        rmcp::model::Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::clone(&self.input_schema),
            annotations: None,
            title: None,
            icons: None,
            output_schema: None,
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("result_shape", &self.result_shape)
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

pub struct ToolDescriptorBuilder {
    name: String,
    description: String,
    properties: JsonObject,
    required: Vec<String>,
    result_shape: ResultShape,
    target: Option<TargetExtractor>,
}

impl ToolDescriptorBuilder {
    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description}),
            required,
        )
    }

    pub fn integer(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "integer", "description": description}),
            required,
        )
    }

    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "boolean", "description": description}),
            required,
        )
    }

    pub fn object(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "object", "description": description}),
            required,
        )
    }

    pub fn string_array(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "array", "items": {"type": "string"}, "description": description}),
            required,
        )
    }

    pub fn returns(mut self, shape: ResultShape) -> Self {
        self.result_shape = shape;
        self
    }

    pub fn target(mut self, extractor: TargetExtractor) -> Self {
        self.target = Some(extractor);
        self
    }

    pub fn build(self) -> ToolDescriptor {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(self.properties));
        if !self.required.is_empty() {
            schema.insert("required".to_string(), json!(self.required));
        }

        ToolDescriptor {
            name: self.name,
            description: self.description,
            input_schema: Arc::new(schema),
            result_shape: self.result_shape,
            target: self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_key(args: &JsonObject) -> Option<String> {
        args.get("projectKey")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    #[test]
    fn test_builder_produces_json_schema() {
        let tool = ToolDescriptor::builder("search_issues", "Search issues")
            .string("projectKey", "Project", true)
            .integer("maxResults", "Page size", false)
            .build();

        assert_eq!(
            Value::Object(tool.input_schema().clone()),
            json!({
                "type": "object",
                "properties": {
                    "projectKey": {"type": "string", "description": "Project"},
                    "maxResults": {"type": "integer", "description": "Page size"}
                },
                "required": ["projectKey"]
            })
        );
        assert_eq!(tool.property_type("maxResults"), Some("integer"));
        assert_eq!(tool.result_shape(), ResultShape::Any);
    }

    #[test]
    fn test_no_required_key_when_nothing_required() {
        let tool = ToolDescriptor::builder("list_jobs", "List jobs").build();
        assert!(tool.input_schema().get("required").is_none());
        assert!(tool.required_fields().is_empty());
    }

    #[test]
    fn test_instance_selector_is_added_once() {
        let tool = ToolDescriptor::builder("list_jobs", "List jobs")
            .build()
            .with_instance_selector()
            .with_instance_selector();

        assert!(tool.accepts_instance());
        assert_eq!(tool.property_type(INSTANCE_ARGUMENT), Some("string"));
        assert_eq!(tool.properties().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_target_extraction() {
        let tool = ToolDescriptor::builder("get_measures", "Measures")
            .string("projectKey", "Project", true)
            .target(project_key)
            .build();

        let mut args = JsonObject::new();
        args.insert("projectKey".to_string(), json!("ABC"));

        assert!(tool.has_target());
        assert_eq!(tool.target(&args), Some("ABC".to_string()));
        assert_eq!(tool.target(&JsonObject::new()), None);
    }

    #[test]
    fn test_result_shapes() {
        assert!(ResultShape::Array.accepts(&json!([])));
        assert!(!ResultShape::Array.accepts(&json!({})));
        assert!(ResultShape::Text.accepts(&json!("log")));
        assert!(ResultShape::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_mcp_tool_shares_schema() {
        let tool = ToolDescriptor::builder("list_jobs", "List jobs").build();
        let mcp = tool.to_mcp_tool();

        assert_eq!(mcp.name, "list_jobs");
        assert_eq!(mcp.input_schema.as_ref(), tool.input_schema());
    }
}
