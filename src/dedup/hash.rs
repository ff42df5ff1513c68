//! File fingerprinting for deduplication.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Read buffer size for streaming digests.
const BUFFER_SIZE: usize = 8192;

/// Lowercase hex MD5 digest of a file's full contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of an in-memory byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Md5::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream a file through MD5, returning the number of bytes read and the digest.
///
/// The length is what was actually hashed, not the size from metadata, so a
/// file that grows during the read still gets a consistent pair.
pub fn fingerprint_file(path: &Path) -> io::Result<(u64, Fingerprint)> {
    let file = File::open(path)?;
    fingerprint_reader(file)
}

/// Stream any reader through MD5.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<(u64, Fingerprint)> {
    let mut hasher = Md5::new();
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut length: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        length += bytes_read as u64;
    }

    let result = hasher.finalize();
    Ok((length, Fingerprint(format!("{:x}", result))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fingerprint_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let (length, fingerprint) = fingerprint_file(temp_file.path()).unwrap();
        assert_eq!(length, 12);
        // MD5 of "test content"
        assert_eq!(fingerprint.as_str(), "9473fdd0d880a43c21b7778d34872157");
    }

    #[test]
    fn test_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();

        let (length, fingerprint) = fingerprint_file(temp_file.path()).unwrap();
        assert_eq!(length, 0);
        assert_eq!(fingerprint.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_multi_buffer_file_matches_in_memory_digest() {
        let data: Vec<u8> = (0..BUFFER_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let (length, fingerprint) = fingerprint_file(temp_file.path()).unwrap();
        assert_eq!(length, data.len() as u64);
        assert_eq!(fingerprint, Fingerprint::of_bytes(&data));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = fingerprint_file(&dir.path().join("gone.epub")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
