#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use lambda_deploy_aws::adapters::function_platform::{
    CodePayload, CodeUpdate, CodeUpdateOutcome, ConfigurationOutcome, FunctionPlatform,
};
use lambda_deploy_aws::adapters::object_store::ArtifactStore;
use lambda_deploy_aws::adapters::AdapterError;
use lambda_deploy_aws::runtime::contract::ConfigurationUpdate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct RecordingStore {
    puts: Mutex<Vec<PutRecord>>,
    failure: Option<AdapterError>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: AdapterError) -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().expect("poisoned mutex").clone()
    }
}

impl ArtifactStore for RecordingStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), AdapterError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.puts.lock().expect("poisoned mutex").push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: body.to_vec(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Code {
        function_name: String,
        payload: CodePayload,
        publish: bool,
    },
    Configuration {
        function_name: String,
        update: ConfigurationUpdate,
    },
}

/// Records every call and answers configuration updates from a script; once
/// the script runs out every configuration update succeeds.
#[derive(Default)]
pub struct ScriptedPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    code_failure: Option<AdapterError>,
    configuration_script: Mutex<VecDeque<AdapterError>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration_failures(failures: impl IntoIterator<Item = AdapterError>) -> Self {
        Self {
            configuration_script: Mutex::new(failures.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_code_failure(error: AdapterError) -> Self {
        Self {
            code_failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn configuration_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, PlatformCall::Configuration { .. }))
            .count()
    }
}

impl FunctionPlatform for ScriptedPlatform {
    fn update_code(
        &self,
        function_name: &str,
        update: &CodeUpdate,
    ) -> Result<CodeUpdateOutcome, AdapterError> {
        self.calls.lock().expect("poisoned mutex").push(PlatformCall::Code {
            function_name: function_name.to_string(),
            payload: update.payload.clone(),
            publish: update.publish,
        });
        if let Some(error) = &self.code_failure {
            return Err(error.clone());
        }
        Ok(CodeUpdateOutcome {
            code_sha256: Some("c29tZS1zaGE=".to_string()),
            version: Some(if update.publish { "7" } else { "$LATEST" }.to_string()),
            last_update_status: Some("InProgress".to_string()),
        })
    }

    fn update_configuration(
        &self,
        function_name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<ConfigurationOutcome, AdapterError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(PlatformCall::Configuration {
                function_name: function_name.to_string(),
                update: update.clone(),
            });
        if let Some(error) = self
            .configuration_script
            .lock()
            .expect("poisoned mutex")
            .pop_front()
        {
            return Err(error);
        }
        Ok(ConfigurationOutcome {
            revision_id: Some("rev-2".to_string()),
            last_update_status: Some("Successful".to_string()),
        })
    }
}

pub fn conflict() -> AdapterError {
    AdapterError::transient(
        "lambda update_function_configuration",
        "The operation cannot be performed at this time. An update is in progress",
    )
    .with_code("ResourceConflictException")
}

pub fn access_denied() -> AdapterError {
    AdapterError::permanent(
        "lambda update_function_configuration",
        "not authorized to perform: lambda:UpdateFunctionConfiguration",
    )
    .with_code("AccessDeniedException")
}
