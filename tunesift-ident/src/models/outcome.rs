//! Provider call outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// One named value in a provider payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    pub name: String,
    pub value: String,
}

/// Provider-specific identification data, in the provider's field order
///
/// Payloads from different providers share no schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    fields: Vec<PayloadField>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping insertion order
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(PayloadField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn fields(&self) -> &[PayloadField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Classification of a failed provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure, timeout or malformed single response
    Transient,
    /// Missing or rejected credential
    Unauthorized,
    /// Unrecognized response shape
    Unknown,
    /// Call abandoned during its rate-limit wait; no request was sent
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one provider call for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hit(Payload),
    Miss,
    Error { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Outcome::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::Transient, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::Unauthorized, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::Unknown, message)
    }

    pub fn cancelled() -> Self {
        Self::error(ErrorKind::Cancelled, "rate-limit wait interrupted")
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit(_))
    }
}
