use serde::{Deserialize, Serialize};

use crate::adapters::AdapterError;
use crate::runtime::contract::{ConfigurationUpdate, ObjectLocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePayload {
    ObjectStore(ObjectLocation),
    ZipFile(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUpdate {
    pub payload: CodePayload,
    pub publish: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeUpdateOutcome {
    pub code_sha256: Option<String>,
    pub version: Option<String>,
    pub last_update_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigurationOutcome {
    pub revision_id: Option<String>,
    pub last_update_status: Option<String>,
}

pub trait FunctionPlatform {
    fn update_code(
        &self,
        function_name: &str,
        update: &CodeUpdate,
    ) -> Result<CodeUpdateOutcome, AdapterError>;

    fn update_configuration(
        &self,
        function_name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<ConfigurationOutcome, AdapterError>;
}
