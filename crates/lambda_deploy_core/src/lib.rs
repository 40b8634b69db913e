//! Deployment domain primitives for publishing Lambda functions.
//!
//! This crate owns request validation, artifact packaging, code-source
//! selection, and the configuration-update retry policy. It intentionally
//! excludes AWS SDK and runtime concerns, which live in `lambda_deploy_aws`.

pub mod artifact;
pub mod code_source;
pub mod contract;
pub mod env_vars;
pub mod retry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
