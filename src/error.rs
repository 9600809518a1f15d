use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::mcp::registry::RegistryError;
use crate::plugins::BackendError;

/// Fatal startup errors
///
/// Raised while reading settings, loading the instance file or assembling
/// the gateway. None of these are recoverable: the process reports the
/// error and exits before serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, missing field or wrong field type.
    ///
    /// serde_json's message carries the line and column of the offending
    /// token.
    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("Unknown system '{name}' (expected one of: {expected})")]
    UnknownSystem { name: String, expected: String },

    #[error("Invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Duplicate tool name in catalogue: {0}")]
    DuplicateTool(String),
}

/// Per-call dispatch failures
///
/// Every variant is recoverable: the dispatcher turns it into an error
/// envelope for the caller and nothing else is affected.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("unknown instance: {0}")]
    InstanceNotFound(String),

    #[error("access denied for this instance: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("unexpected response from backend: {0}")]
    UnexpectedResult(String),
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InstanceNotFound(name) => DispatchError::InstanceNotFound(name),
            other => DispatchError::InstanceNotFound(other.to_string()),
        }
    }
}

/// Errors raised by the REST bridge itself
///
/// Tool-level failures never show up here; they travel inside a 200
/// envelope. Only malformed requests and faults of the bridge do.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "REST bridge fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Errors for the JSON-RPC side of the MCP surface
///
/// # Error Conversion
///
/// Converted to `rmcp::ErrorData` so that the JSON-RPC error object has
/// the standard code for each failure:
///
/// | McpServiceError Variant | MCP Error Code   |
/// |-------------------------|------------------|
/// | InvalidRequest          | INVALID_REQUEST  |
/// | MethodNotFound          | METHOD_NOT_FOUND |
/// | InvalidParams           | INVALID_PARAMS   |
/// | Internal                | INTERNAL_ERROR   |
#[derive(Debug, Error)]
pub enum McpServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method '{0}' not supported")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<McpServiceError> for rmcp::ErrorData {
    fn from(err: McpServiceError) -> Self {
        use rmcp::model::{ErrorCode, ErrorData};

        let code = match &err {
            McpServiceError::InvalidRequest(_) => ErrorCode::INVALID_REQUEST,
            McpServiceError::MethodNotFound(_) => ErrorCode::METHOD_NOT_FOUND,
            McpServiceError::InvalidParams(_) => ErrorCode::INVALID_PARAMS,
            McpServiceError::Internal(_) => ErrorCode::INTERNAL_ERROR,
        };

        ErrorData {
            code,
            message: err.to_string().into(),
            data: None,
        }
    }
}
