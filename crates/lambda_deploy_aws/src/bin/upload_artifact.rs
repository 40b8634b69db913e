use std::process::ExitCode;

use clap::Parser;
use lambda_deploy_aws::app::{self, Command};
use lambda_deploy_aws::cli::DeployArgs;
use lambda_deploy_aws::logging;

#[derive(Parser)]
#[command(name = "upload_artifact", version, about = "Upload a function artifact (zip or runtime binary) to S3")]
struct Cli {
    #[command(flatten)]
    args: DeployArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    app::exit_code(Command::UploadArtifact, app::run(Command::UploadArtifact, cli.args).await)
}
