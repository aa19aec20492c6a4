//! HTTP request handlers

use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub mod blanketing;
pub mod health;
pub mod horse;
pub mod journal;
pub mod shavings;
pub mod supplement;
pub mod task;
pub mod weather;

pub use blanketing::*;
pub use health::*;
pub use horse::*;
pub use journal::*;
pub use shavings::*;
pub use supplement::*;
pub use task::*;
pub use weather::*;

/// Parse a JSON body the client may leave out.
///
/// A blank body is `None`; a body that is present must parse, and a parse
/// failure is reported against `field`.
pub(crate) fn optional_body<T: DeserializeOwned>(body: &[u8], field: &str) -> AppResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::invalid(field, format!("Invalid request body: {}", e)))
}
