//! Helpers for log messages.

use std::error::Error;

/// Render an error and all of its sources on one line.
pub fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut detail = error.source();
    while let Some(cause) = detail {
        message.push_str(" Detail: ");
        message.push_str(&cause.to_string());
        detail = cause.source();
    }
    message
}
