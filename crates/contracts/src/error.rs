//! Layered error definitions
//!
//! Categorized by source: config / template / batch / model / artifact

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Templating Errors =====
    /// Template could not be loaded or is malformed
    #[error("template '{template}' error: {message}")]
    Template { template: String, message: String },

    /// Template references a field the render context does not provide
    #[error("template '{template}' references unknown field '{field}'")]
    MissingTemplateField { template: String, field: String },

    // ===== Composition Errors =====
    /// Batch composition error
    #[error("batch composition error: {message}")]
    BatchComposition { message: String },

    /// An artifact references a persona that does not exist upstream
    #[error("unknown persona '{persona_id}' referenced by {context}")]
    UnknownPersona { persona_id: String, context: String },

    // ===== Model Errors =====
    /// Model API returned a non-success status
    #[error("model api error ({status}): {message}")]
    ModelApi { status: u16, message: String },

    /// Model API rejected the request with 429
    #[error("model api rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Request never produced a response (connect / body errors)
    #[error("model transport error: {message}")]
    ModelTransport { message: String },

    /// Request exceeded its timeout
    #[error("model request timed out after {timeout_secs}s")]
    ModelTimeout { timeout_secs: u64 },

    /// Response body did not have the expected structure
    #[error("malformed model response: {message}")]
    MalformedResponse { message: String },

    // ===== Artifact Errors =====
    /// Upstream artifact has not been produced yet
    #[error("artifact not found: {path} (run the '{stage}' stage first)")]
    ArtifactMissing { path: String, stage: String },

    /// Artifact exists but cannot be decoded
    #[error("artifact '{path}' is malformed: {message}")]
    ArtifactFormat { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create template error
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create batch composition error
    pub fn batch_composition(message: impl Into<String>) -> Self {
        Self::BatchComposition {
            message: message.into(),
        }
    }

    /// Create unknown persona error
    pub fn unknown_persona(persona_id: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownPersona {
            persona_id: persona_id.into(),
            context: context.into(),
        }
    }

    /// Create artifact format error
    pub fn artifact_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArtifactFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether a model call failing with this error may succeed on retry.
    ///
    /// Client errors other than 408/429 are permanent; everything else on the
    /// model path is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ModelApi { status, .. } => !(400..500).contains(status) || *status == 408,
            Self::RateLimited { .. }
            | Self::ModelTransport { .. }
            | Self::ModelTimeout { .. }
            | Self::MalformedResponse { .. } => true,
            _ => false,
        }
    }
}
