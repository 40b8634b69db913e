use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::adapters::aws::{load_sdk_config, LambdaFunctionPlatform, S3ArtifactStore};
use crate::adapters::function_platform::FunctionPlatform;
use crate::adapters::object_store::ArtifactStore;
use crate::cli::DeployArgs;
use crate::handlers::deploy::{
    deploy, update_code, update_configuration, upload_artifact, DeployError,
};
use crate::runtime::contract::{normalize_request, DeployParams};
use crate::runtime::retry::{Clock, RetryPolicy, SystemClock};

/// The four entry points, each running a subset of the deploy stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    UploadArtifact,
    UpdateCode,
    UpdateConfiguration,
    Deploy,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Self::UploadArtifact => "upload_artifact",
            Self::UpdateCode => "update_code",
            Self::UpdateConfiguration => "update_configuration",
            Self::Deploy => "deploy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub params: DeployParams,
    pub policy: RetryPolicy,
}

/// Validates everything that can be checked locally. Nothing here touches the
/// network, so bad input fails before any client exists.
pub fn prepare(args: &DeployArgs) -> Result<Invocation> {
    let request = args
        .to_request()
        .context("failed to read deployment parameters")?;
    let params = normalize_request(request).context("invalid deployment parameters")?;
    let policy = args
        .retry
        .policy()
        .context("invalid configuration retry settings")?;
    Ok(Invocation { params, policy })
}

pub fn execute(
    command: Command,
    invocation: &Invocation,
    store: &impl ArtifactStore,
    platform: &impl FunctionPlatform,
    clock: &dyn Clock,
) -> Result<Value, DeployError> {
    let params = &invocation.params;
    let policy = &invocation.policy;
    let report = match command {
        Command::UploadArtifact => serde_json::to_value(upload_artifact(params, store)?)?,
        Command::UpdateCode => serde_json::to_value(update_code(params, platform)?)?,
        Command::UpdateConfiguration => {
            serde_json::to_value(update_configuration(params, platform, policy, clock)?)?
        }
        Command::Deploy => {
            serde_json::to_value(deploy(params, store, platform, policy, clock)?)?
        }
    };
    Ok(report)
}

pub async fn run(command: Command, args: DeployArgs) -> Result<()> {
    let invocation = prepare(&args)?;
    info!(
        command = command.name(),
        function_name = %invocation.params.function_name,
        region = invocation.params.region.as_deref().unwrap_or("default"),
        "starting"
    );

    let sdk_config = load_sdk_config(invocation.params.region.as_deref())
        .await
        .context("failed to construct AWS clients")?;
    let handle = Handle::current();
    let store = S3ArtifactStore::new(&sdk_config, handle.clone());
    let platform = LambdaFunctionPlatform::new(&sdk_config, handle);

    let report = tokio::task::spawn_blocking(move || {
        execute(command, &invocation, &store, &platform, &SystemClock)
    })
    .await
    .context("deploy task panicked")??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Logs a failed run and maps it to the process exit status.
pub fn exit_code(command: Command, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => {
            info!(command = command.name(), "finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(command = command.name(), error = %format!("{err:#}"), "failed");
            ExitCode::FAILURE
        }
    }
}
