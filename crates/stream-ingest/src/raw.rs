//! Raw report bytes and their content hash.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{IngestError, Result};

/// A report file as read from disk.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub content_hash: String,
}

impl RawFile {
    /// Read a file and hash its contents.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_bytes(path, bytes))
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let content_hash = content_hash(&bytes);
        Self {
            path: path.to_path_buf(),
            bytes,
            content_hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Compute the SHA-256 content hash used as the dedup key.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_hashes_contents() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"hello world").unwrap();
        temp_file.flush().unwrap();

        let raw = RawFile::read(temp_file.path()).unwrap();
        assert_eq!(raw.bytes, b"hello world");
        assert_eq!(
            raw.content_hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_same_bytes_same_hash() {
        let a = RawFile::from_bytes(Path::new("a.tsv"), b"x\ty\n".to_vec());
        let b = RawFile::from_bytes(Path::new("b.tsv"), b"x\ty\n".to_vec());
        let c = RawFile::from_bytes(Path::new("a.tsv"), b"x\tz\n".to_vec());
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn test_read_missing_file() {
        let result = RawFile::read(Path::new("/nonexistent/report.tsv"));
        assert!(matches!(result, Err(IngestError::FileRead { .. })));
    }
}
