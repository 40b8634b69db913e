use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::adapters::function_platform::{
    CodePayload, CodeUpdate, CodeUpdateOutcome, ConfigurationOutcome, FunctionPlatform,
};
use crate::adapters::object_store::ArtifactStore;
use crate::adapters::AdapterError;
use crate::runtime::artifact::{load_artifact, ArtifactError};
use crate::runtime::code_source::{
    require_upload_target, resolve_code_source, upload_target, CodeSource, UploadTarget,
};
use crate::runtime::contract::{DeployParams, ValidationError};
use crate::runtime::retry::{retry_with_policy, Clock, RetryError, RetryPolicy};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid deployment parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("failed to upload artifact to s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: AdapterError,
    },
    #[error("failed to update code of function '{function_name}': {source}")]
    CodeUpdate {
        function_name: String,
        #[source]
        source: AdapterError,
    },
    #[error("failed to update configuration of function '{function_name}': {source}")]
    ConfigurationUpdate {
        function_name: String,
        #[source]
        source: RetryError<AdapterError>,
    },
    #[error("failed to render deploy report: {0}")]
    Report(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadReport {
    pub bucket: String,
    pub key: String,
    pub bytes: usize,
    pub sha256: String,
    pub wrapped_binary: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CodeReport {
    pub source: CodeSource,
    pub outcome: CodeUpdateOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigurationReport {
    Skipped,
    Applied {
        attempts: u32,
        elapsed_ms: u64,
        outcome: ConfigurationOutcome,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeployReport {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadReport>,
    pub code: CodeReport,
    pub configuration: ConfigurationReport,
    pub duration_ms: u64,
    pub finished_at: String,
}

/// Reads the local artifact and stages it at the requested bucket/key.
pub fn upload_artifact(
    params: &DeployParams,
    store: &impl ArtifactStore,
) -> Result<UploadReport, DeployError> {
    let target = require_upload_target(params)?;
    upload_to_target(&target, store)
}

fn upload_to_target(
    target: &UploadTarget,
    store: &impl ArtifactStore,
) -> Result<UploadReport, DeployError> {
    let artifact = load_artifact(&target.path)?;
    let bucket = target.object.bucket.clone();
    let key = target.object.key.clone();

    info!(
        bucket = %bucket,
        key = %key,
        path = %target.path.display(),
        bytes = artifact.len(),
        sha256 = %artifact.sha256,
        wrapped_binary = artifact.wrapped_binary,
        "uploading artifact"
    );

    store
        .put_object(&bucket, &key, &artifact.bytes)
        .map_err(|source| DeployError::Upload {
            bucket: bucket.clone(),
            key: key.clone(),
            source,
        })?;

    info!(bucket = %bucket, key = %key, "artifact uploaded");
    Ok(UploadReport {
        bucket,
        key,
        bytes: artifact.len(),
        sha256: artifact.sha256,
        wrapped_binary: artifact.wrapped_binary,
    })
}

/// Points the function at new code. A staged bucket/key is always used when
/// present; the local archive is only sent inline when no object is named.
pub fn update_code(
    params: &DeployParams,
    platform: &impl FunctionPlatform,
) -> Result<CodeReport, DeployError> {
    let source = resolve_code_source(params)?;
    let payload = match &source {
        CodeSource::ObjectStore(location) => CodePayload::ObjectStore(location.clone()),
        CodeSource::InlineArchive { path } => {
            let artifact = load_artifact(path)?;
            info!(
                path = %path.display(),
                bytes = artifact.len(),
                sha256 = %artifact.sha256,
                "sending archive inline"
            );
            CodePayload::ZipFile(artifact.bytes)
        }
    };

    let update = CodeUpdate {
        payload,
        publish: params.publish,
    };
    let outcome = platform
        .update_code(&params.function_name, &update)
        .map_err(|source| DeployError::CodeUpdate {
            function_name: params.function_name.clone(),
            source,
        })?;

    info!(
        function_name = %params.function_name,
        code_sha256 = outcome.code_sha256.as_deref().unwrap_or_default(),
        version = outcome.version.as_deref().unwrap_or_default(),
        "function code updated"
    );
    Ok(CodeReport { source, outcome })
}

/// Applies the configuration fields present in `params`, retrying while the
/// platform reports the function as busy.
pub fn update_configuration(
    params: &DeployParams,
    platform: &impl FunctionPlatform,
    policy: &RetryPolicy,
    clock: &dyn Clock,
) -> Result<ConfigurationReport, DeployError> {
    let Some(update) = params.configuration_update() else {
        info!(
            function_name = %params.function_name,
            "no configuration fields given, skipping configuration update"
        );
        return Ok(ConfigurationReport::Skipped);
    };

    let outcome = retry_with_policy(policy, clock, |attempt| {
        info!(
            function_name = %params.function_name,
            attempt,
            "updating function configuration"
        );
        platform.update_configuration(&params.function_name, &update)
    })
    .map_err(|source| {
        error!(
            function_name = %params.function_name,
            attempts = source.attempts(),
            error_code = source.last_error().code.as_deref().unwrap_or_default(),
            "configuration update failed"
        );
        DeployError::ConfigurationUpdate {
            function_name: params.function_name.clone(),
            source,
        }
    })?;

    info!(
        function_name = %params.function_name,
        attempts = outcome.attempts,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "function configuration updated"
    );
    Ok(ConfigurationReport::Applied {
        attempts: outcome.attempts,
        elapsed_ms: outcome.elapsed.as_millis() as u64,
        outcome: outcome.value,
    })
}

/// Upload, code update, and configuration update in order. The first failure
/// aborts; stages that already completed are left in place.
pub fn deploy(
    params: &DeployParams,
    store: &impl ArtifactStore,
    platform: &impl FunctionPlatform,
    policy: &RetryPolicy,
    clock: &dyn Clock,
) -> Result<DeployReport, DeployError> {
    let started_at = Instant::now();
    resolve_code_source(params)?;

    let upload = upload_target(params)
        .map(|target| upload_to_target(&target, store))
        .transpose()?;
    let code = update_code(params, platform)?;
    let configuration = update_configuration(params, platform, policy, clock)?;

    Ok(DeployReport {
        function_name: params.function_name.clone(),
        upload,
        code,
        configuration,
        duration_ms: started_at.elapsed().as_millis() as u64,
        finished_at: Utc::now().to_rfc3339(),
    })
}
