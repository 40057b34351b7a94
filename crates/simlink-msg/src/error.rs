//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Parse failure taxonomy shared by the parser and diagnostics."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use crate::kind::MessageKind;
use crate::types::ErrorCode;

/// Reason an inbound payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Text is not valid JSON.
    #[error("malformed payload: {detail}")]
    Malformed {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
        /// Parser detail.
        detail: String,
    },
    /// Text is valid JSON but not an object.
    #[error("payload must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
    /// The same key appears twice in the top-level object.
    #[error("duplicate field `{field}`")]
    DuplicateField {
        /// Repeated key.
        field: String,
    },
    /// Generic dispatch needs the `type` discriminator.
    #[error("missing discriminator field `type`")]
    MissingDiscriminator,
    /// Discriminator names no known kind.
    #[error("unknown message kind `{tag}`")]
    UnknownKind {
        /// Discriminator value received.
        tag: String,
    },
    /// Discriminator names a different kind than the one requested.
    #[error("expected `{expected}` message, found `{found}`")]
    KindMismatch {
        /// Kind the caller asked for.
        expected: MessageKind,
        /// Discriminator value received.
        found: String,
    },
    /// A required field is absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },
    /// A field is present but its value cannot be converted to the declared type.
    #[error("invalid value at `{path}`: {detail}")]
    TypeMismatch {
        /// Dotted path of the offending value.
        path: String,
        /// Expected/found description.
        detail: String,
    },
}

/// Coarse failure classes used for metrics labels and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ParseFailureCategory {
    /// Not well-formed structured text.
    Malformed,
    /// Required field absent.
    MissingField,
    /// Field value of the wrong type.
    TypeMismatch,
    /// Discriminator absent, unknown, or naming another kind.
    KindMismatch,
}

impl ParseFailureCategory {
    /// Label value used in metrics.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl ParseError {
    /// Failure class.
    pub fn category(&self) -> ParseFailureCategory {
        match self {
            ParseError::Malformed { .. }
            | ParseError::NotAnObject { .. }
            | ParseError::DuplicateField { .. } => ParseFailureCategory::Malformed,
            ParseError::MissingField { .. } => ParseFailureCategory::MissingField,
            ParseError::TypeMismatch { .. } => ParseFailureCategory::TypeMismatch,
            ParseError::MissingDiscriminator
            | ParseError::UnknownKind { .. }
            | ParseError::KindMismatch { .. } => ParseFailureCategory::KindMismatch,
        }
    }

    /// Field path the failure refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ParseError::MissingField { field } | ParseError::DuplicateField { field } => {
                Some(field)
            }
            ParseError::TypeMismatch { path, .. } => Some(path),
            ParseError::MissingDiscriminator
            | ParseError::UnknownKind { .. }
            | ParseError::KindMismatch { .. } => Some(crate::kind::TAG_FIELD),
            ParseError::Malformed { .. } | ParseError::NotAnObject { .. } => None,
        }
    }

    /// Code a session layer would put in its [`crate::ErrorMessage`] reply.
    pub fn error_code(&self) -> ErrorCode {
        match self.category() {
            ParseFailureCategory::Malformed => ErrorCode::MalformedMessage,
            ParseFailureCategory::MissingField => ErrorCode::MissingField,
            ParseFailureCategory::TypeMismatch => ErrorCode::TypeMismatch,
            ParseFailureCategory::KindMismatch => ErrorCode::UnexpectedMessage,
        }
    }
}
