//! Error types for FHIR models

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid FHIR resource: {0}")]
    InvalidResource(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value: {0}")]
    InvalidFieldValue(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A modifier extension the caller does not understand was found at `path`.
    #[error("Unrecognized modifier extension at {path}: {url}")]
    UnrecognizedModifierExtension { path: String, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
