pub use common::errors::{ErrorKind, TaggedError};

pub type ServiceResult<T> = Result<T, TaggedError>;

pub fn not_found(entity: &str, id: &str) -> TaggedError {
    TaggedError::not_found(format!("{entity} with ID {id} not found."))
}

/// Fatal backend failure, keeping the underlying error as cause.
pub fn database(
    message: impl Into<String>,
    cause: impl Into<common::errors::BoxError>,
) -> TaggedError {
    TaggedError::wrap(ErrorKind::Database, message, cause)
}
