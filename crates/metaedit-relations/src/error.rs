use metaedit_model::ModelError;
use metaedit_palette::PaletteError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("relationship configuration error: {0}")]
    Configuration(String),
    #[error("rule reads `{property}` of the known record, but none was given")]
    MissingParent { property: String },
    #[error("expected a model of provider `{expected}`, got `{actual}`")]
    ProviderMismatch { expected: String, actual: String },
    #[error("model `{0}` not found")]
    ModelNotFound(String),
    #[error("cannot paste relative to `{0}`: it is part of the cut selection")]
    CircularReference(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RelationshipError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn provider_mismatch(expected: &str, actual: &str) -> Self {
        Self::ProviderMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Errors loading a container definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid container JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("invalid container `{container}`: {message}")]
    Invalid { container: String, message: String },
}
