use serde_json::Value;

use crate::contract::{Environment, ValidationError};

/// Names the Lambda runtime sets itself; the platform refuses updates that
/// try to override them.
pub const RESERVED_VARIABLES: &[&str] = &[
    "_HANDLER",
    "_X_AMZN_TRACE_ID",
    "AWS_ACCESS_KEY",
    "AWS_ACCESS_KEY_ID",
    "AWS_DEFAULT_REGION",
    "AWS_EXECUTION_ENV",
    "AWS_LAMBDA_FUNCTION_MEMORY_SIZE",
    "AWS_LAMBDA_FUNCTION_NAME",
    "AWS_LAMBDA_FUNCTION_VERSION",
    "AWS_LAMBDA_INITIALIZATION_TYPE",
    "AWS_LAMBDA_LOG_GROUP_NAME",
    "AWS_LAMBDA_LOG_STREAM_NAME",
    "AWS_LAMBDA_RUNTIME_API",
    "AWS_REGION",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "LAMBDA_RUNTIME_DIR",
    "LAMBDA_TASK_ROOT",
];

/// Decodes the JSON object given for the function's environment.
///
/// Absent or blank input returns `Ok(None)`, which leaves the deployed
/// function's environment untouched. Anything else must be a flat JSON object
/// of string values.
pub fn parse_environment(raw: Option<&str>) -> Result<Option<Environment>, ValidationError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(text).map_err(|error| {
        ValidationError::new(format!("environment variables must be valid JSON: {error}"))
    })?;

    let Value::Object(entries) = value else {
        return Err(ValidationError::new(
            "environment variables must be a JSON object",
        ));
    };

    let mut environment = Environment::new();
    for (name, value) in entries {
        if name.trim().is_empty() {
            return Err(ValidationError::new(
                "environment variable names must be non-empty strings",
            ));
        }
        if RESERVED_VARIABLES.contains(&name.as_str()) {
            return Err(ValidationError::new(format!(
                "environment variable '{name}' is reserved by the Lambda runtime"
            )));
        }
        let Value::String(text) = value else {
            return Err(ValidationError::new(format!(
                "environment variable '{name}' must have a string value"
            )));
        };
        environment.insert(name, text);
    }

    Ok(Some(environment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_object_yields_one_variable() {
        let environment = parse_environment(Some(r#"{"KEY":"VALUE"}"#))
            .expect("valid json should parse")
            .expect("non-empty input should produce a mapping");

        assert_eq!(environment.len(), 1);
        assert_eq!(environment.get("KEY").map(String::as_str), Some("VALUE"));
    }

    #[test]
    fn absent_or_blank_input_leaves_environment_untouched() {
        assert_eq!(parse_environment(None).expect("absent is fine"), None);
        assert_eq!(parse_environment(Some("  \n")).expect("blank is fine"), None);
    }

    #[test]
    fn empty_object_clears_environment() {
        let environment = parse_environment(Some("{}"))
            .expect("empty object should parse")
            .expect("empty object is an explicit mapping");
        assert!(environment.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let error = parse_environment(Some("{KEY:VALUE}")).expect_err("should fail");
        assert!(error.message().starts_with("environment variables must be valid JSON"));
    }

    #[test]
    fn rejects_non_object_and_non_string_values() {
        let error = parse_environment(Some(r#"["KEY"]"#)).expect_err("array should fail");
        assert_eq!(error.message(), "environment variables must be a JSON object");

        let error = parse_environment(Some(r#"{"PORT":8080}"#)).expect_err("number should fail");
        assert!(error.message().contains("'PORT' must have a string value"));
    }

    #[test]
    fn rejects_reserved_runtime_variables() {
        let error = parse_environment(Some(r#"{"AWS_REGION":"eu-west-1"}"#))
            .expect_err("reserved name should fail");
        assert!(error.message().contains("reserved"));
    }
}
