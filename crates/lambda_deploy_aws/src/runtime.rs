pub use lambda_deploy_core::{artifact, code_source, contract, env_vars, retry};
