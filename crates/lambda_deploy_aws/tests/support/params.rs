#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lambda_deploy_aws::runtime::artifact::package_bootstrap_zip;
use lambda_deploy_aws::runtime::contract::{normalize_request, DeployParams, DeployRequest};

pub const FUNCTION_NAME: &str = "orders-api";
pub const BUCKET: &str = "deploy-artifacts";
pub const KEY: &str = "orders-api/build-42.zip";

pub fn request() -> DeployRequest {
    DeployRequest {
        function_name: FUNCTION_NAME.to_string(),
        ..DeployRequest::default()
    }
}

pub fn params(request: DeployRequest) -> DeployParams {
    normalize_request(request).expect("request should pass validation")
}

/// Writes a small valid archive into `dir` and returns its path and bytes.
pub fn write_archive(dir: &Path) -> (PathBuf, Vec<u8>) {
    let bytes = package_bootstrap_zip(b"\x7fELF orders runtime").expect("package archive");
    let path = dir.join("orders-api.zip");
    fs::write(&path, &bytes).expect("write archive");
    (path, bytes)
}
