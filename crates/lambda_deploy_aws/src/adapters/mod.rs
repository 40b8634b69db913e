pub mod aws;
pub mod function_platform;
pub mod object_store;

use thiserror::Error;

use crate::runtime::retry::{Classify, FailureKind};

/// Failure reported by an object-store or function-platform call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct AdapterError {
    pub operation: &'static str,
    pub kind: FailureKind,
    pub code: Option<String>,
    pub message: String,
}

impl AdapterError {
    pub fn transient(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: FailureKind::Transient,
            code: None,
            message: message.into(),
        }
    }

    pub fn permanent(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: FailureKind::Permanent,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl Classify for AdapterError {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}
