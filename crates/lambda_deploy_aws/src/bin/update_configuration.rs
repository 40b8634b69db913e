use std::process::ExitCode;

use clap::Parser;
use lambda_deploy_aws::app::{self, Command};
use lambda_deploy_aws::cli::DeployArgs;
use lambda_deploy_aws::logging;

#[derive(Parser)]
#[command(name = "update_configuration", version, about = "Update a Lambda function's role, memory, timeout, and environment")]
struct Cli {
    #[command(flatten)]
    args: DeployArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    app::exit_code(Command::UpdateConfiguration, app::run(Command::UpdateConfiguration, cli.args).await)
}
