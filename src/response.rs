//! GraphQL response bodies.

use serde::Serialize;
use serde_json::{Map, Value};

/// Extension codes that mark an error as a protocol-level failure rather than a field error.
pub const PROTOCOL_ERROR_CODES: &[&str] = &["GRAPHQL_PARSE_FAILED", "GRAPHQL_VALIDATION_FAILED"];

/// A single entry of a GraphQL response's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphError {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphError {
    /// Constructs an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        GraphError {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// Adds an entry to the error's `extensions` object.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the `code` extension, if set to a string.
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }

    /// Returns true if the error's code is one of [`PROTOCOL_ERROR_CODES`].
    pub fn is_protocol_error(&self) -> bool {
        self.code()
            .map_or(false, |code| PROTOCOL_ERROR_CODES.contains(&code))
    }
}

/// A GraphQL response body.
///
/// `data` is always serialized, as `null` when absent; `errors` and `extensions` are omitted when
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphError>,

    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphResponse {
    /// Constructs a successful response from result data.
    pub fn from_data(data: impl Into<Value>) -> Self {
        GraphResponse {
            data: Some(data.into()),
            ..Default::default()
        }
    }

    /// Constructs an error response with `null` data.
    pub fn from_errors(errors: Vec<GraphError>) -> Self {
        GraphResponse {
            errors,
            ..Default::default()
        }
    }
}
