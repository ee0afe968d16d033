use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    MissingField,
    TypeMismatch,
    Corrupted,
    Unknown,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeErrorKind::MissingField => "missing field",
            DecodeErrorKind::TypeMismatch => "type mismatch",
            DecodeErrorKind::Corrupted => "corrupted data",
            DecodeErrorKind::Unknown => "unknown decode error",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid response envelope: {0}")]
    EnvelopeDecode(#[source] serde_json::Error),

    #[error("response is not valid text: {0}")]
    Encoding(String),

    #[error("menu document has no usable `{0}` field")]
    Schema(String),

    #[error("{kind} at `{path}`: {detail}")]
    Decode {
        kind: DecodeErrorKind,
        path: String,
        detail: String,
    },
}

impl ParseError {
    pub(super) fn missing(path: impl Into<String>, detail: impl Into<String>) -> Self {
        ParseError::Decode {
            kind: DecodeErrorKind::MissingField,
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(super) fn mismatch(path: impl Into<String>, expected: &str, found: &str) -> Self {
        ParseError::Decode {
            kind: DecodeErrorKind::TypeMismatch,
            path: path.into(),
            detail: format!("expected {expected}, found {found}"),
        }
    }

    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            ParseError::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            ParseError::Decode { path, .. } => Some(path),
            ParseError::Schema(field) => Some(field),
            _ => None,
        }
    }
}
