use std::collections::HashMap;
use std::future::Future;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::Environment;
use aws_sdk_s3::primitives::ByteStream;
use tokio::runtime::Handle;

use crate::adapters::function_platform::{
    CodePayload, CodeUpdate, CodeUpdateOutcome, ConfigurationOutcome, FunctionPlatform,
};
use crate::adapters::object_store::ArtifactStore;
use crate::adapters::AdapterError;
use crate::runtime::contract::ConfigurationUpdate;
use crate::runtime::retry::{classify_error_code, FailureKind};

/// Loads the shared SDK configuration. An explicit region overrides the
/// default provider chain; a configuration without any region is rejected
/// because neither client could address an endpoint.
pub async fn load_sdk_config(region: Option<&str>) -> Result<SdkConfig, AdapterError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let config = loader.load().await;

    if config.region().is_none() {
        return Err(AdapterError::permanent(
            "load_sdk_config",
            "no AWS region configured; pass --region or set AWS_REGION",
        ));
    }
    Ok(config)
}

pub struct S3ArtifactStore {
    s3_client: aws_sdk_s3::Client,
    handle: Handle,
}

impl S3ArtifactStore {
    pub fn new(config: &SdkConfig, handle: Handle) -> Self {
        Self {
            s3_client: aws_sdk_s3::Client::new(config),
            handle,
        }
    }
}

impl ArtifactStore for S3ArtifactStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), AdapterError> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();

        block_on(&self.handle, async move {
            client
                .put_object()
                .bucket(bucket)
                .key(object_key)
                .body(ByteStream::from(body_bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| adapter_error("s3 put_object", error))
        })
    }
}

pub struct LambdaFunctionPlatform {
    lambda_client: aws_sdk_lambda::Client,
    handle: Handle,
}

impl LambdaFunctionPlatform {
    pub fn new(config: &SdkConfig, handle: Handle) -> Self {
        Self {
            lambda_client: aws_sdk_lambda::Client::new(config),
            handle,
        }
    }
}

impl FunctionPlatform for LambdaFunctionPlatform {
    fn update_code(
        &self,
        function_name: &str,
        update: &CodeUpdate,
    ) -> Result<CodeUpdateOutcome, AdapterError> {
        let mut request = self
            .lambda_client
            .update_function_code()
            .function_name(function_name)
            .publish(update.publish);
        request = match &update.payload {
            CodePayload::ObjectStore(location) => request
                .s3_bucket(location.bucket.clone())
                .s3_key(location.key.clone()),
            CodePayload::ZipFile(bytes) => request.zip_file(Blob::new(bytes.clone())),
        };

        block_on(&self.handle, async move {
            request
                .send()
                .await
                .map(|output| CodeUpdateOutcome {
                    code_sha256: output.code_sha256().map(str::to_string),
                    version: output.version().map(str::to_string),
                    last_update_status: output
                        .last_update_status()
                        .map(|status| status.as_str().to_string()),
                })
                .map_err(|error| adapter_error("lambda update_function_code", error))
        })
    }

    fn update_configuration(
        &self,
        function_name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<ConfigurationOutcome, AdapterError> {
        let environment = update.environment.as_ref().map(|variables| {
            Environment::builder()
                .set_variables(Some(
                    variables
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect::<HashMap<_, _>>(),
                ))
                .build()
        });

        let request = self
            .lambda_client
            .update_function_configuration()
            .function_name(function_name)
            .set_role(update.role.clone())
            .set_memory_size(update.memory_size)
            .set_timeout(update.timeout)
            .set_handler(update.handler.clone())
            .set_description(update.description.clone())
            .set_environment(environment);

        block_on(&self.handle, async move {
            request
                .send()
                .await
                .map(|output| ConfigurationOutcome {
                    revision_id: output.revision_id().map(str::to_string),
                    last_update_status: output
                        .last_update_status()
                        .map(|status| status.as_str().to_string()),
                })
                .map_err(|error| adapter_error("lambda update_function_configuration", error))
        })
    }
}

fn block_on<F: Future>(handle: &Handle, future: F) -> F::Output {
    tokio::task::block_in_place(|| handle.block_on(future))
}

/// Transport-level failures (timeouts, dispatch, unreadable responses) are
/// transient; service errors are classified by their error code.
pub fn adapter_error<E, R>(operation: &'static str, error: SdkError<E, R>) -> AdapterError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = error.code().map(str::to_string);
    let kind = match &error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            FailureKind::Transient
        }
        SdkError::ServiceError(_) => classify_error_code(code.as_deref()),
        _ => FailureKind::Permanent,
    };

    AdapterError {
        operation,
        kind,
        code,
        message: DisplayErrorContext(error).to_string(),
    }
}
