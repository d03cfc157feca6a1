//! Uniform operation-boundary result shape.
//!
//! Every service operation is converted to `{success, data?, error?,
//! code?}` before it reaches the UI tier — no error type crosses the
//! boundary raw, and failures select toast messages by `code`.

use serde::Serialize;

use crate::error::{CompassError, CompassResult};

#[derive(Debug, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(err: &CompassError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            code: err.code(),
        }
    }
}

impl<T> From<CompassResult<T>> for ActionResult<T> {
    fn from(result: CompassResult<T>) -> Self {
        match result {
            Ok(data) => ActionResult::ok(data),
            Err(err) => ActionResult::err(&err),
        }
    }
}
