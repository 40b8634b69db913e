use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Args;

use crate::runtime::contract::{DeployRequest, ValidationError};
use crate::runtime::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

/// Additional environment variables consulted, in order, when neither the flag
/// nor its primary variable is set. The `INPUT_*` names are how CI actions
/// expose their inputs.
pub const ENV_FALLBACKS: &[(&str, &[&str])] = &[
    ("region", &["AWS_REGION", "INPUT_AWS_REGION"]),
    ("s3Bucket", &["INPUT_S3_BUCKET"]),
    ("s3Key", &["INPUT_S3_KEY"]),
    ("functionName", &["INPUT_FUNCTION_NAME"]),
    ("zipFile", &["INPUT_ZIP_FILE"]),
    ("environmentVariables", &["INPUT_ENVIRONMENT_VARIABLES"]),
    ("role", &["INPUT_ROLE_ARN"]),
    ("memorySize", &["INPUT_MEMORY_SIZE"]),
    ("timeout", &["INPUT_TIMEOUT"]),
    ("handler", &["INPUT_HANDLER"]),
    ("description", &["INPUT_DESCRIPTION"]),
    ("publish", &["INPUT_PUBLISH"]),
];

#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// AWS Region
    #[arg(long, env = "REGION", help_heading = "Target")]
    pub region: Option<String>,

    /// Lambda function name or ARN
    #[arg(
        long = "functionName",
        visible_alias = "function-name",
        env = "FUNCTION_NAME",
        help_heading = "Target"
    )]
    pub function_name: Option<String>,

    /// S3 bucket name containing the binary
    #[arg(
        long = "s3Bucket",
        visible_alias = "s3-bucket",
        env = "S3_BUCKET",
        help_heading = "Artifact"
    )]
    pub s3_bucket: Option<String>,

    /// S3 key of the binary
    #[arg(
        long = "s3Key",
        visible_alias = "s3-key",
        env = "S3_KEY",
        help_heading = "Artifact"
    )]
    pub s3_key: Option<String>,

    /// Binary or zip archive to be uploaded
    #[arg(
        long = "zipFile",
        visible_alias = "zip-file",
        env = "ZIP_FILE",
        value_name = "PATH",
        help_heading = "Artifact"
    )]
    pub zip_file: Option<PathBuf>,

    /// Publish a new version after updating the code
    #[arg(
        long,
        env = "PUBLISH",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        help_heading = "Artifact"
    )]
    pub publish: Option<bool>,

    /// Environment variables for the function, as a JSON object of strings
    #[arg(
        long = "environmentVariables",
        visible_alias = "environment-variables",
        env = "ENVIRONMENT_VARIABLES",
        value_name = "JSON",
        help_heading = "Configuration"
    )]
    pub environment_variables: Option<String>,

    /// Execution role ARN
    #[arg(long, env = "ROLE_ARN", value_name = "ARN", help_heading = "Configuration")]
    pub role: Option<String>,

    /// Memory size in MB
    #[arg(
        long = "memorySize",
        visible_alias = "memory-size",
        env = "MEMORY_SIZE",
        help_heading = "Configuration"
    )]
    pub memory_size: Option<i32>,

    /// Function timeout in seconds
    #[arg(long, env = "TIMEOUT", help_heading = "Configuration")]
    pub timeout: Option<i32>,

    /// Handler name
    #[arg(long, env = "HANDLER", help_heading = "Configuration")]
    pub handler: Option<String>,

    /// Function description
    #[arg(long, env = "DESCRIPTION", help_heading = "Configuration")]
    pub description: Option<String>,

    #[command(flatten)]
    pub retry: RetryArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RetryArgs {
    /// Seconds to wait before the first configuration retry
    #[arg(
        long,
        env = "CONFIG_RETRY_INTERVAL_SECS",
        default_value_t = 2.0,
        help_heading = "Retry"
    )]
    pub retry_interval_secs: f64,

    /// Multiplier applied to the interval after each retry (1.0 keeps it fixed)
    #[arg(
        long,
        env = "CONFIG_RETRY_BACKOFF_FACTOR",
        default_value_t = 1.0,
        help_heading = "Retry"
    )]
    pub retry_backoff_factor: f64,

    /// Maximum number of configuration update attempts
    #[arg(
        long,
        env = "CONFIG_RETRY_MAX_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        help_heading = "Retry"
    )]
    pub retry_max_attempts: u32,

    /// Seconds after which no further configuration attempt is started
    #[arg(
        long,
        env = "CONFIG_RETRY_DEADLINE_SECS",
        default_value_t = 20.0,
        help_heading = "Retry"
    )]
    pub retry_deadline_secs: f64,
}

impl Default for RetryArgs {
    fn default() -> Self {
        Self {
            retry_interval_secs: 2.0,
            retry_backoff_factor: 1.0,
            retry_max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_deadline_secs: 20.0,
        }
    }
}

impl RetryArgs {
    pub fn policy(&self) -> Result<RetryPolicy, ValidationError> {
        let interval = seconds("retry interval", self.retry_interval_secs)?;
        let deadline = seconds("retry deadline", self.retry_deadline_secs)?;
        RetryPolicy::from_interval(
            self.retry_max_attempts,
            interval,
            self.retry_backoff_factor,
            deadline,
        )
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration, ValidationError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ValidationError::new(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        ))
    })
}

impl DeployArgs {
    /// Builds the raw request, filling unset values from [`ENV_FALLBACKS`].
    pub fn to_request(&self) -> Result<DeployRequest, ValidationError> {
        self.to_request_with(|name| std::env::var(name).ok())
    }

    pub fn to_request_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<DeployRequest, ValidationError> {
        let text = |value: &Option<String>, flag: &str| -> Option<String> {
            value.clone().or_else(|| fallback(flag, &lookup))
        };

        Ok(DeployRequest {
            function_name: text(&self.function_name, "functionName").unwrap_or_default(),
            bucket: text(&self.s3_bucket, "s3Bucket"),
            key: text(&self.s3_key, "s3Key"),
            region: text(&self.region, "region"),
            artifact_path: self
                .zip_file
                .clone()
                .or_else(|| fallback("zipFile", &lookup).map(PathBuf::from)),
            role: text(&self.role, "role"),
            memory_size: integer(self.memory_size, "memorySize", &lookup)?,
            timeout: integer(self.timeout, "timeout", &lookup)?,
            environment_json: text(&self.environment_variables, "environmentVariables"),
            handler: text(&self.handler, "handler"),
            description: text(&self.description, "description"),
            publish: match self.publish {
                Some(publish) => publish,
                None => fallback("publish", &lookup)
                    .map(|raw| boolish("publish", &raw))
                    .transpose()?
                    .unwrap_or(false),
            },
        })
    }
}

fn fallback(flag: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    ENV_FALLBACKS
        .iter()
        .find(|(name, _)| *name == flag)
        .into_iter()
        .flat_map(|(_, variables)| variables.iter())
        .find_map(|variable| lookup(variable).filter(|value| !value.trim().is_empty()))
}

fn integer(
    value: Option<i32>,
    flag: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<i32>, ValidationError> {
    if value.is_some() {
        return Ok(value);
    }
    fallback(flag, lookup)
        .map(|raw| {
            raw.trim().parse::<i32>().map_err(|error| {
                ValidationError::new(format!("{flag} must be an integer, got '{raw}': {error}"))
            })
        })
        .transpose()
}

/// Accepts the same spellings as clap's `BoolishValueParser`, so a fallback
/// variable means what the primary one would.
fn boolish(flag: &str, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(ValidationError::new(format!(
            "{flag} must be a boolean, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: DeployArgs,
    }

    fn parse(argv: &[&str]) -> DeployArgs {
        TestCli::try_parse_from(std::iter::once("deploy").chain(argv.iter().copied()))
            .expect("arguments should parse")
            .args
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name: &str| values.get(name).cloned()
    }

    #[test]
    fn flags_win_over_fallback_variables() {
        let args = DeployArgs {
            region: Some("eu-west-1".to_string()),
            function_name: Some("orders-api".to_string()),
            ..DeployArgs::default()
        };
        let lookup = lookup_from(&[
            ("AWS_REGION", "us-east-1"),
            ("INPUT_FUNCTION_NAME", "other"),
        ]);

        let request = args.to_request_with(lookup).expect("request should build");
        assert_eq!(request.region.as_deref(), Some("eu-west-1"));
        assert_eq!(request.function_name, "orders-api");
    }

    #[test]
    fn fallback_variables_fill_unset_flags_in_order() {
        let lookup = lookup_from(&[
            ("INPUT_AWS_REGION", "ap-south-1"),
            ("AWS_REGION", "us-east-2"),
            ("INPUT_S3_BUCKET", "artifacts"),
            ("INPUT_S3_KEY", "orders.zip"),
            ("INPUT_MEMORY_SIZE", " 256 "),
            ("INPUT_PUBLISH", "true"),
            ("INPUT_ZIP_FILE", "target/orders.zip"),
        ]);

        let request = DeployArgs::default()
            .to_request_with(lookup)
            .expect("request should build");
        assert_eq!(request.region.as_deref(), Some("us-east-2"));
        assert_eq!(request.bucket.as_deref(), Some("artifacts"));
        assert_eq!(request.key.as_deref(), Some("orders.zip"));
        assert_eq!(request.memory_size, Some(256));
        assert_eq!(
            request.artifact_path,
            Some(PathBuf::from("target/orders.zip"))
        );
        assert!(request.publish);
        assert!(request.function_name.is_empty());
    }

    #[test]
    fn non_numeric_fallback_is_rejected() {
        let lookup = lookup_from(&[("INPUT_TIMEOUT", "thirty")]);

        let error = DeployArgs::default()
            .to_request_with(lookup)
            .expect_err("timeout must be numeric");
        assert!(error.message().starts_with("timeout must be an integer"));
    }

    #[test]
    fn retry_args_build_fixed_and_exponential_policies() {
        let fixed = RetryArgs::default().policy().expect("defaults are valid");
        assert_eq!(fixed, RetryPolicy::default());

        let exponential = RetryArgs {
            retry_backoff_factor: 2.0,
            ..RetryArgs::default()
        }
        .policy()
        .expect("exponential policy is valid");
        assert_ne!(exponential.backoff, fixed.backoff);

        let negative = RetryArgs {
            retry_interval_secs: -1.0,
            ..RetryArgs::default()
        };
        assert!(negative.policy().is_err());
    }

    #[test]
    fn publish_accepts_boolish_values() {
        assert_eq!(parse(&["--publish"]).publish, Some(true));
        assert_eq!(parse(&["--publish", "1"]).publish, Some(true));
        assert_eq!(parse(&["--publish", "yes"]).publish, Some(true));
        assert_eq!(parse(&["--publish", "off"]).publish, Some(false));
        assert!(TestCli::try_parse_from(["deploy", "--publish", "maybe"]).is_err());
    }

    #[test]
    fn explicit_publish_false_wins_over_fallback() {
        let lookup = lookup_from(&[("INPUT_PUBLISH", "true")]);

        let request = parse(&["--publish", "false"])
            .to_request_with(lookup)
            .expect("request should build");
        assert!(!request.publish);
    }

    #[test]
    fn fallback_publish_uses_the_same_spellings() {
        let request = DeployArgs::default()
            .to_request_with(lookup_from(&[("INPUT_PUBLISH", "yes")]))
            .expect("request should build");
        assert!(request.publish);

        let error = DeployArgs::default()
            .to_request_with(lookup_from(&[("INPUT_PUBLISH", "sometimes")]))
            .expect_err("unknown spelling is rejected");
        assert!(error.message().starts_with("publish must be a boolean"));
    }
}
