#![allow(missing_docs)]

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SqlsetError>;

/// Errors raised while loading statement sets, rendering statements, or mapping rows.
///
/// Load-time variants are either resource-fatal ([`SqlsetError::Namespace`],
/// [`SqlsetError::Sealed`]) or entry-local; the loader logs and skips entry-local
/// failures instead of returning them.
#[derive(Debug, Error)]
pub enum SqlsetError {
    /// The statement set declares neither a namespace nor a name.
    #[error("statement set '{resource}' has an empty namespace")]
    Namespace { resource: String },
    /// The definition document's root is not a statement set.
    #[error("resource '{resource}' has root <{found}>, expected <sqlset>")]
    UnexpectedRoot { resource: String, found: String },
    /// A required attribute is absent from a definition element.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    /// An attribute is present but cannot be interpreted.
    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: &'static str, value: String },
    /// A declared language-level or native type name is not registered.
    #[error("type alias or type not found: {0}")]
    UnknownTypeAlias(String),
    /// An alias is already bound to a different type.
    #[error("alias '{alias}' is already mapped to '{existing}'")]
    AliasConflict { alias: String, existing: String },
    /// A statement id was registered twice under a strict duplicate policy.
    #[error("statement '{0}' is already registered")]
    DuplicateStatement(String),
    /// A row mapper names a target type nobody registered.
    #[error("row mapper target type not found: {0}")]
    TargetTypeNotFound(String),
    /// A row mapper was asked to materialise a type other than its declared target.
    #[error("row mapper '{mapper}' targets '{expected}', not '{found}'")]
    TargetMismatch {
        mapper: String,
        expected: String,
        found: &'static str,
    },
    /// A templated fragment body is structurally invalid.
    #[error("template error: {0}")]
    Template(String),
    /// A value transform (cipher, encoding, digest, coercion) failed.
    #[error("value transform failed: {0}")]
    Transform(String),
    /// Assigning a mapped value to a target property failed.
    #[error("cannot assign property '{property}': {reason}")]
    Property { property: String, reason: String },
    /// No statement is registered under the qualified id.
    #[error("statement not found: {0}")]
    StatementNotFound(String),
    /// No row mapper is registered under the qualified id.
    #[error("row mapper not found: {0}")]
    RowMapperNotFound(String),
    /// The catalog was sealed before this resource was loaded.
    #[error("catalog is sealed; refusing to load '{0}'")]
    Sealed(String),
    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
    /// I/O failure while reading a definition resource.
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    /// A JSON definition document or parameter payload is malformed.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SqlsetError {
    pub(crate) fn transform(msg: impl Into<String>) -> Self {
        SqlsetError::Transform(msg.into())
    }

    pub(crate) fn template(msg: impl Into<String>) -> Self {
        SqlsetError::Template(msg.into())
    }
}
