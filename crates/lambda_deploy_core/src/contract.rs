use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env_vars::parse_environment;

pub const MIN_MEMORY_SIZE_MB: i32 = 128;
pub const MAX_MEMORY_SIZE_MB: i32 = 10_240;
pub const MIN_TIMEOUT_SECS: i32 = 1;
pub const MAX_TIMEOUT_SECS: i32 = 900;

pub type Environment = BTreeMap<String, String>;

/// Deployment input exactly as bound from flags and environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployRequest {
    pub function_name: String,
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub region: Option<String>,
    pub artifact_path: Option<PathBuf>,
    pub role: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
    pub environment_json: Option<String>,
    pub handler: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployParams {
    pub function_name: String,
    pub object: Option<ObjectLocation>,
    pub region: Option<String>,
    pub artifact_path: Option<PathBuf>,
    pub role: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
    pub environment: Option<Environment>,
    pub handler: Option<String>,
    pub description: Option<String>,
    pub publish: bool,
}

/// Fields sent to the platform's configuration-update call. `None` leaves the
/// corresponding setting unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    pub role: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
    pub environment: Option<Environment>,
    pub handler: Option<String>,
    pub description: Option<String>,
}

impl ConfigurationUpdate {
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.memory_size.is_none()
            && self.timeout.is_none()
            && self.environment.is_none()
            && self.handler.is_none()
            && self.description.is_none()
    }
}

impl DeployParams {
    pub fn configuration_update(&self) -> Option<ConfigurationUpdate> {
        let update = ConfigurationUpdate {
            role: self.role.clone(),
            memory_size: self.memory_size,
            timeout: self.timeout,
            environment: self.environment.clone(),
            handler: self.handler.clone(),
            description: self.description.clone(),
        };
        (!update.is_empty()).then_some(update)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn normalize_request(request: DeployRequest) -> Result<DeployParams, ValidationError> {
    let function_name = request.function_name.trim().to_string();
    if function_name.is_empty() {
        return Err(ValidationError::new("function_name cannot be empty"));
    }

    let object = match (non_blank(request.bucket), non_blank(request.key)) {
        (Some(bucket), Some(key)) => Some(ObjectLocation { bucket, key }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ValidationError::new(
                "s3 key is required when a bucket is given",
            ));
        }
        (None, Some(_)) => {
            return Err(ValidationError::new(
                "s3 bucket is required when a key is given",
            ));
        }
    };

    if let Some(memory_size) = request.memory_size {
        if !(MIN_MEMORY_SIZE_MB..=MAX_MEMORY_SIZE_MB).contains(&memory_size) {
            return Err(ValidationError::new(format!(
                "memory_size must be between {MIN_MEMORY_SIZE_MB} and {MAX_MEMORY_SIZE_MB} MB, got {memory_size}"
            )));
        }
    }

    if let Some(timeout) = request.timeout {
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout) {
            return Err(ValidationError::new(format!(
                "timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds, got {timeout}"
            )));
        }
    }

    if matches!(&request.role, Some(role) if role.trim().is_empty()) {
        return Err(ValidationError::new("role cannot be blank when given"));
    }

    let artifact_path = request
        .artifact_path
        .filter(|path| !path.as_os_str().is_empty());

    let environment = parse_environment(request.environment_json.as_deref())?;

    Ok(DeployParams {
        function_name,
        object,
        region: non_blank(request.region),
        artifact_path,
        role: request.role.map(|role| role.trim().to_string()),
        memory_size: request.memory_size,
        timeout: request.timeout,
        environment,
        handler: non_blank(request.handler),
        description: non_blank(request.description),
        publish: request.publish,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
