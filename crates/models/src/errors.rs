use common::{ErrorKind, TaggedError};
use thiserror::Error;

/// A single violated schema constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Constraint {
    #[error("is required")]
    Required,
    #[error("must be a {0}")]
    Type(&'static str),
    #[error("must be at least {0} characters")]
    MinLength(usize),
    #[error("must be at most {0} characters")]
    MaxLength(usize),
    #[error("must be a valid email address")]
    Email,
}

/// First failing constraint found while checking input against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {constraint}")]
pub struct ValidationIssue {
    pub schema: &'static str,
    pub field: String,
    pub constraint: Constraint,
}

impl From<ValidationIssue> for TaggedError {
    fn from(issue: ValidationIssue) -> Self {
        let message = format!("invalid {} input: {}", issue.schema, issue);
        TaggedError::wrap(ErrorKind::Validation, message, issue)
    }
}
