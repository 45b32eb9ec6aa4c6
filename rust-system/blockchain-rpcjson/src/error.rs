//! Error taxonomy shared by the registry, marshaler and unmarshaler

use std::fmt;

/// Stable, machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A method name was registered more than once
    DuplicateMethod,
    /// The usage flag combination is not recognized
    InvalidUsageFlags,
    /// A value could not be converted to the declared field type
    InvalidType,
    /// A command declares an embedded (flattened) field
    EmbeddedType,
    /// A command declares a field that is not publicly accessible
    UnexportedField,
    /// A command declares a field whose type has no wire representation
    UnsupportedFieldType,
    /// A required field follows an optional one
    NonOptionalField,
    /// A default value is attached to a required field
    NonOptionalDefault,
    /// A default value does not match the field's unwrapped type
    MismatchedDefault,
    /// The method or command type was never registered
    UnregisteredMethod,
    /// Help was requested for a method registered without a description
    MissingDescription,
    /// Too few or too many positional parameters
    NumParams,
    /// A command's `encode` visited a different number of fields than it declares
    InconsistentCommand,
}

impl ErrorKind {
    /// Runtime errors come from malformed or version-mismatched input and must be
    /// surfaced to the caller. Everything else is a programmer error.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidType | ErrorKind::UnregisteredMethod | ErrorKind::NumParams
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateMethod => "ErrDuplicateMethod",
            ErrorKind::InvalidUsageFlags => "ErrInvalidUsageFlags",
            ErrorKind::InvalidType => "ErrInvalidType",
            ErrorKind::EmbeddedType => "ErrEmbeddedType",
            ErrorKind::UnexportedField => "ErrUnexportedField",
            ErrorKind::UnsupportedFieldType => "ErrUnsupportedFieldType",
            ErrorKind::NonOptionalField => "ErrNonOptionalField",
            ErrorKind::NonOptionalDefault => "ErrNonOptionalDefault",
            ErrorKind::MismatchedDefault => "ErrMismatchedDefault",
            ErrorKind::UnregisteredMethod => "ErrUnregisteredMethod",
            ErrorKind::MissingDescription => "ErrMissingDescription",
            ErrorKind::NumParams => "ErrNumParams",
            ErrorKind::InconsistentCommand => "ErrInconsistentCommand",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Engine error: a kind, a human description and an optional underlying cause
#[derive(Debug, thiserror::Error)]
#[error("{description}")]
pub struct Error {
    kind: ErrorKind,
    description: String,
    #[source]
    source: Option<Cause>,
}

impl Error {
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            source: None,
        }
    }

    /// Attach the underlying cause (usually a `serde_json` failure)
    pub fn with_source(mut self, source: impl Into<Cause>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn invalid_type(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidType, description)
    }

    /// Prefix the description with positional context, keeping kind and cause
    pub(crate) fn in_param(self, index: usize, name: &str) -> Self {
        Self {
            description: format!("parameter #{} '{}' {}", index + 1, name, self.description),
            ..self
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
