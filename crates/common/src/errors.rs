//! Tagged error taxonomy shared by every layer.
//!
//! A [`TaggedError`] carries a discriminant ([`ErrorKind`]) and its name, a
//! human message, an optional wrapped cause and an optional captured trace.
//! Layers wrap lower-layer failures as the cause while substituting their own
//! kind and message. Callers may define their own names through
//! [`TaggedError::custom`]; those share [`ErrorKind::Custom`].
//!
//! Recognition across process or serialization boundaries is structural: any
//! JSON object with `name` and `message` keys is a tagged error (see
//! [`is_tagged_error`] and [`ErrorPayload`]).

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type AppResult<T> = Result<T, TaggedError>;

/// Discriminant of a tagged error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    UpdateNotProvided,
    Validation,
    Authentication,
    Database,
    VersionConflict,
    /// Any caller-defined name outside the built-in set.
    Custom,
}

impl ErrorKind {
    /// Built-in kinds, `Custom` excluded.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::NotFound,
        ErrorKind::UpdateNotProvided,
        ErrorKind::Validation,
        ErrorKind::Authentication,
        ErrorKind::Database,
        ErrorKind::VersionConflict,
    ];

    /// Stable name used as the `name` field of serialized errors. For
    /// `Custom` this is only the fallback; the error carries its own name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::UpdateNotProvided => "UpdateNotProvidedError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Database => "DatabaseError",
            ErrorKind::VersionConflict => "VersionConflictError",
            ErrorKind::Custom => "CustomError",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Validation => 1001,
            ErrorKind::UpdateNotProvided => 1002,
            ErrorKind::NotFound => 1003,
            ErrorKind::Authentication => 1004,
            ErrorKind::VersionConflict => 1005,
            ErrorKind::Custom => 1000,
            ErrorKind::Database => 1200,
        }
    }
}

#[derive(Debug, Error)]
#[error("{name}: {message}")]
pub struct TaggedError {
    kind: ErrorKind,
    name: Cow<'static, str>,
    message: String,
    #[source]
    cause: Option<BoxError>,
    trace: Option<String>,
}

impl TaggedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::named(kind, Cow::Borrowed(kind.name()), message.into())
    }

    /// Error with a caller-chosen name. A name matching a built-in kind
    /// yields that kind; anything else is `ErrorKind::Custom`.
    ///
    /// ```
    /// use common::{ErrorKind, TaggedError};
    ///
    /// let err = TaggedError::custom("MyCustomError", "This is a custom error");
    /// assert_eq!(err.name(), "MyCustomError");
    /// assert_eq!(err.kind(), ErrorKind::Custom);
    /// assert!(TaggedError::custom("NotFoundError", "gone").is(ErrorKind::NotFound));
    /// ```
    pub fn custom(name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ErrorKind::from_name(&name).unwrap_or(ErrorKind::Custom);
        Self::named(kind, name, message.into())
    }

    fn named(kind: ErrorKind, name: Cow<'static, str>, message: String) -> Self {
        Self { kind, name, message, cause: None, trace: capture_trace() }
    }

    /// Wrap a lower-layer error under a new kind and message.
    pub fn wrap(kind: ErrorKind, message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::new(kind, message).with_cause(cause)
    }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(ErrorKind::NotFound, message) }

    pub fn update_not_provided(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpdateNotProvided, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn database(message: impl Into<String>) -> Self { Self::new(ErrorKind::Database, message) }

    pub fn version_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VersionConflict, message)
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind { self.kind }

    pub fn name(&self) -> &str { &self.name }

    pub fn message(&self) -> &str { &self.message }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> { self.cause.as_deref() }

    pub fn trace(&self) -> Option<&str> { self.trace.as_deref() }

    pub fn is(&self, kind: ErrorKind) -> bool { self.kind == kind }

    /// Serializable view of this error and its whole cause chain.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            name: self.name.to_string(),
            message: self.message.clone(),
            cause: self.cause.as_deref().map(|c| Box::new(payload_of(c))),
            stack: self.trace.clone(),
        }
    }

    /// Rebuild a tagged error from its wire form. Unknown names are kept
    /// under `ErrorKind::Custom`.
    pub fn from_payload(payload: ErrorPayload) -> Self {
        let kind = ErrorKind::from_name(&payload.name).unwrap_or(ErrorKind::Custom);
        Self {
            kind,
            name: Cow::Owned(payload.name),
            message: payload.message,
            cause: payload.cause.map(|c| Box::new(*c) as BoxError),
            trace: payload.stack,
        }
    }
}

/// Wire form of a tagged error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{name}: {message}")]
pub struct ErrorPayload {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[source]
    pub cause: Option<Box<ErrorPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorPayload {
    /// Lenient structural parse; `None` unless both `name` and `message` keys
    /// exist. Non-string values are kept in their JSON text form.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !is_tagged_error(value) {
            return None;
        }
        let name = text_of(&value["name"]);
        let message = text_of(&value["message"]);
        let cause = value.get("cause").and_then(Self::from_value).map(Box::new);
        let stack = value.get("stack").and_then(|s| s.as_str()).map(str::to_string);
        Some(Self { name, message, cause, stack })
    }
}

fn text_of(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Structural check: an object carrying `name` and `message` keys, whatever
/// their values.
pub fn is_tagged_error(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("name") && obj.contains_key("message"))
}

/// Find the first tagged error in a source chain, starting at `err` itself.
pub fn find_tagged<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a TaggedError> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(tagged) = e.downcast_ref::<TaggedError>() {
            return Some(tagged);
        }
        current = e.source();
    }
    None
}

fn payload_of(err: &(dyn StdError + 'static)) -> ErrorPayload {
    if let Some(tagged) = err.downcast_ref::<TaggedError>() {
        return tagged.to_payload();
    }
    if let Some(payload) = err.downcast_ref::<ErrorPayload>() {
        return payload.clone();
    }
    ErrorPayload {
        name: "Error".to_string(),
        message: err.to_string(),
        cause: err.source().map(|c| Box::new(payload_of(c))),
        stack: None,
    }
}

fn capture_trace() -> Option<String> {
    let bt = Backtrace::capture();
    match bt.status() {
        BacktraceStatus::Captured => Some(bt.to_string()),
        _ => None,
    }
}
