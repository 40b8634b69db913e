use crate::adapters::AdapterError;

pub trait ArtifactStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), AdapterError>;
}
