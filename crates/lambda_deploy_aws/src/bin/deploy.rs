use std::process::ExitCode;

use clap::Parser;
use lambda_deploy_aws::app::{self, Command};
use lambda_deploy_aws::cli::DeployArgs;
use lambda_deploy_aws::logging;

#[derive(Parser)]
#[command(name = "deploy", version, about = "Upload an artifact, update function code, then update its configuration")]
struct Cli {
    #[command(flatten)]
    args: DeployArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    app::exit_code(Command::Deploy, app::run(Command::Deploy, cli.args).await)
}
