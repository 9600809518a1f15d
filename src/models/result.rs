use crate::error::DispatchError;
use crate::models::tool::ResultShape;
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

/// Outcome of exactly one dispatch
///
/// Both variants serialize to the MCP `CallToolResult` envelope
/// (`{"content": [...], "isError": bool}`), whichever surface the call
/// came in on.
#[derive(Debug, Clone)]
pub enum ToolCallResult {
    Ok { content: Vec<Content> },
    Error { message: String },
}

impl ToolCallResult {
    /// Wraps backend data according to the tool's result shape
    ///
    /// Text results are passed through verbatim; everything else is
    /// rendered as pretty-printed JSON.
    pub fn from_data(shape: ResultShape, data: Value) -> Self {
        let text = match (shape, data) {
            (ResultShape::Text, Value::String(text)) => text,
            (_, data) => serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
        };

        ToolCallResult::Ok {
            content: vec![Content::text(text)],
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolCallResult::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolCallResult::Error { .. })
    }

    /// Error message, if this is an error
    pub fn message(&self) -> Option<&str> {
        match self {
            ToolCallResult::Error { message } => Some(message),
            ToolCallResult::Ok { .. } => None,
        }
    }

    pub fn into_call_result(self) -> CallToolResult {
        match self {
            ToolCallResult::Ok { content } => CallToolResult::success(content),
            ToolCallResult::Error { message } => {
                CallToolResult::error(vec![Content::text(message)])
            }
        }
    }

    /// The envelope as JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.clone().into_call_result()).unwrap_or(Value::Null)
    }
}

impl From<DispatchError> for ToolCallResult {
    fn from(err: DispatchError) -> Self {
        ToolCallResult::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_shape() {
        let envelope = ToolCallResult::error("boom").to_json();

        assert_eq!(envelope["isError"], json!(true));
        assert_eq!(envelope["content"][0]["type"], json!("text"));
        assert_eq!(envelope["content"][0]["text"], json!("boom"));
    }

    #[test]
    fn test_ok_envelope_renders_json() {
        let result = ToolCallResult::from_data(ResultShape::Object, json!({"name": "build"}));
        let envelope = result.to_json();

        assert!(!result.is_error());
        assert_eq!(envelope["isError"], json!(false));
        let text = envelope["content"][0]["text"].as_str().expect("text block");
        assert_eq!(
            serde_json::from_str::<Value>(text).expect("json text"),
            json!({"name": "build"})
        );
    }

    #[test]
    fn test_text_results_are_verbatim() {
        let envelope = ToolCallResult::from_data(ResultShape::Text, json!("line 1\nline 2")).to_json();
        assert_eq!(envelope["content"][0]["text"], json!("line 1\nline 2"));
    }

    #[test]
    fn test_dispatch_error_keeps_message() {
        let result: ToolCallResult = DispatchError::UnknownTool("nope".to_string()).into();
        assert_eq!(result.message(), Some("unknown tool: nope"));
    }
}
