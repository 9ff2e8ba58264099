use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RuleQueryError>;

#[derive(Debug, Error)]
pub enum RuleQueryError {
    #[error("missing context: {0}")]
    MissingContext(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("rule source unavailable: {0}")]
    RuleSource(String),

    #[error("search engine failure: {0}")]
    Engine(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RuleQueryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingContext(_) => "MISSING_CONTEXT",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::RuleSource(_) => "RULE_SOURCE_UNAVAILABLE",
            Self::Engine(_) => "ENGINE_FAILURE",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Toml(_) => "TOML_ERROR",
        }
    }

    /// Errors the caller caused; these are rejected before the engine is called.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(self, Self::MissingContext(_) | Self::MalformedInput(_))
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            details: None,
        }
    }
}
