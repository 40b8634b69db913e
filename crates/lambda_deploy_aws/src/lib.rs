//! AWS-oriented adapters, handlers, and entry points for deploying Lambda
//! functions.
//!
//! This crate owns runtime integration details (S3 and Lambda SDK clients,
//! CLI binding, logging) and exposes a single runtime module boundary for the
//! contract, artifact, and retry primitives of `lambda_deploy_core`.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod handlers;
pub mod logging;
pub mod runtime;
