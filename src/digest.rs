//! # Content Digest Module
//!
//! Identità dei file basata sul contenuto: MD5 (128 bit) dell'intero file,
//! codificato in esadecimale minuscolo. Due file con gli stessi byte sono
//! lo stesso lavoro già fatto.

use crate::error::OptimizeError;
use md5::{Digest, Md5};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Length of the hex form of a digest.
pub const DIGEST_HEX_LEN: usize = 32;

const READ_CHUNK: usize = 64 * 1024;

/// Lowercase hex MD5 of a file's full contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Hash the file at `path`, streaming it in chunks.
    pub async fn of_file(path: &Path) -> Result<Self, OptimizeError> {
        let hash_err = |source| OptimizeError::Hash {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).await.map_err(hash_err)?;
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await.map_err(hash_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("not a 128-bit hex digest: {0:?}")]
pub struct InvalidDigest(pub String);

impl FromStr for ContentDigest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != DIGEST_HEX_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidDigest(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}
