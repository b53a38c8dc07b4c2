//! Shared utilities: the tagged error taxonomy, logging bootstrap and
//! environment helpers used by every other crate in the workspace.

pub mod env;
pub mod errors;
pub mod utils;

pub use errors::{AppResult, ErrorKind, TaggedError};
pub use utils::logging::{init_logging, LogFormat, LogLevel};

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Emit an error-level event marked with `severity = "CRITICAL"`.
///
/// ```
/// common::critical!(store = "users", "store file is unreadable");
/// ```
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::__private::tracing::error!(severity = "CRITICAL", $($arg)+)
    };
}
