use std::path::PathBuf;

use thiserror::Error;

/// Problems with a schema, raised while registering or loading it. Never
/// raised while converting data.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("intersection type `{0}` has no single coercion strategy")]
    IntersectionType(String),

    #[error("field `{field}` of model `{model}`: {source}")]
    Field {
        model: String,
        field: String,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("model `{0}` is registered more than once")]
    DuplicateModel(String),

    #[error("field `{field}` of model `{model}` refers to unregistered model `{target}`")]
    UnknownModel {
        model: String,
        field: String,
        target: String,
    },

    #[error("root type `{0}` is not a registered model")]
    UnknownRoot(String),

    #[error("invalid type name `{0}`")]
    InvalidTypeName(String),

    #[error("enum member `{0}` is not a scalar")]
    InvalidEnumMember(String),

    #[error(transparent)]
    Parse(#[from] PathError),

    #[error("failed to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A deserialization error together with the JSON path it happened at.
#[derive(Debug, Error)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

/// Raised by callers that turn scores into a verdict.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("value does not conform to `{target}` (yes: {yes}, maybe: {maybe}, no: {no})")]
    Rejected {
        target: String,
        yes: u64,
        maybe: u64,
        no: u64,
    },
}
