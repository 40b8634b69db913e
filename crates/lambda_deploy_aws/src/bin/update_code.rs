use std::process::ExitCode;

use clap::Parser;
use lambda_deploy_aws::app::{self, Command};
use lambda_deploy_aws::cli::DeployArgs;
use lambda_deploy_aws::logging;

#[derive(Parser)]
#[command(name = "update_code", version, about = "Point a Lambda function at new code from S3 or a local archive")]
struct Cli {
    #[command(flatten)]
    args: DeployArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    app::exit_code(Command::UpdateCode, app::run(Command::UpdateCode, cli.args).await)
}
