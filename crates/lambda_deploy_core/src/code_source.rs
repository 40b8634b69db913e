use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::contract::{DeployParams, ObjectLocation, ValidationError};

/// Where the function's new code comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CodeSource {
    /// Point the function at an archive already staged in the object store.
    ObjectStore(ObjectLocation),
    /// Send the local archive bytes directly with the code-update call.
    InlineArchive { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTarget {
    pub path: PathBuf,
    pub object: ObjectLocation,
}

/// An explicit bucket/key always wins over the local artifact, so a code update
/// never re-sends a file that has already been staged.
pub fn resolve_code_source(params: &DeployParams) -> Result<CodeSource, ValidationError> {
    match (&params.object, &params.artifact_path) {
        (Some(object), _) => Ok(CodeSource::ObjectStore(object.clone())),
        (None, Some(path)) => Ok(CodeSource::InlineArchive { path: path.clone() }),
        (None, None) => Err(ValidationError::new(
            "either an s3 bucket/key or a local zip file is required to update code",
        )),
    }
}

pub fn upload_target(params: &DeployParams) -> Option<UploadTarget> {
    match (&params.artifact_path, &params.object) {
        (Some(path), Some(object)) => Some(UploadTarget {
            path: path.clone(),
            object: object.clone(),
        }),
        _ => None,
    }
}

pub fn require_upload_target(params: &DeployParams) -> Result<UploadTarget, ValidationError> {
    upload_target(params).ok_or_else(|| {
        ValidationError::new("uploading requires a local zip file and an s3 bucket/key")
    })
}
