use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry name a custom-runtime Lambda archive must contain.
pub const BOOTSTRAP_ENTRY: &str = "bootstrap";

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact '{}' does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("artifact '{}' is empty", path.display())]
    Empty { path: PathBuf },
    #[error("failed to read artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to package bootstrap archive: {0}")]
    Packaging(#[from] ZipError),
}

/// Deployable archive held in memory for the duration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub source_path: PathBuf,
    pub bytes: Vec<u8>,
    pub sha256: String,
    pub wrapped_binary: bool,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reads `path` into memory. A file that is not already a zip archive is
/// treated as a compiled runtime binary and wrapped as `bootstrap`.
pub fn load_artifact(path: &Path) -> Result<Artifact, ArtifactError> {
    let raw = fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if raw.is_empty() {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }

    let wrapped_binary = !is_zip_archive(&raw);
    let bytes = if wrapped_binary {
        package_bootstrap_zip(&raw)?
    } else {
        raw
    };

    Ok(Artifact {
        source_path: path.to_path_buf(),
        sha256: sha256_hex(&bytes),
        bytes,
        wrapped_binary,
    })
}

pub fn is_zip_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_LOCAL_HEADER)
}

pub fn package_bootstrap_zip(binary: &[u8]) -> Result<Vec<u8>, ArtifactError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(BOOTSTRAP_ENTRY, options)?;
    zip.write_all(binary).map_err(ZipError::from)?;
    Ok(zip.finish()?.into_inner())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn wraps_raw_binary_as_executable_bootstrap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bootstrap");
        fs::write(&path, b"\x7fELF fake runtime").expect("write binary");

        let artifact = load_artifact(&path).expect("artifact should load");
        assert!(artifact.wrapped_binary);
        assert!(is_zip_archive(&artifact.bytes));

        let mut archive = ZipArchive::new(Cursor::new(artifact.bytes.clone())).expect("zip");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name(BOOTSTRAP_ENTRY).expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        assert_eq!(contents, b"\x7fELF fake runtime");
    }

    #[test]
    fn passes_existing_zip_through_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("function.zip");
        let archive = package_bootstrap_zip(b"runtime").expect("package");
        fs::write(&path, &archive).expect("write zip");

        let artifact = load_artifact(&path).expect("artifact should load");
        assert!(!artifact.wrapped_binary);
        assert_eq!(artifact.bytes, archive);
        assert_eq!(artifact.sha256, sha256_hex(&archive));
        assert_eq!(artifact.sha256.len(), 64);
    }

    #[test]
    fn reports_missing_and_empty_files() {
        let dir = tempfile::tempdir().expect("tempdir");

        let missing = load_artifact(&dir.path().join("absent.zip")).expect_err("missing");
        assert!(matches!(missing, ArtifactError::NotFound { .. }));

        let empty_path = dir.path().join("empty.zip");
        fs::write(&empty_path, b"").expect("write empty");
        let empty = load_artifact(&empty_path).expect_err("empty");
        assert!(matches!(empty, ArtifactError::Empty { .. }));
        assert!(empty.to_string().contains("is empty"));
    }
}
