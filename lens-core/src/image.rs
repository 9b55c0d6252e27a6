//! Image input and content fingerprinting.

use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::HashError;

/// Caller-supplied reference to image bytes.
#[derive(Debug, Clone)]
pub enum ImageHandle {
    /// Local file, read when needed.
    File(PathBuf),
    /// Bytes already in memory (e.g. an upload).
    Bytes(Arc<[u8]>),
}

impl ImageHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self::Bytes(Arc::from(bytes))
    }

    /// Read the full image content.
    pub async fn read(&self) -> Result<Arc<[u8]>, HashError> {
        match self {
            Self::Bytes(bytes) => Ok(Arc::clone(bytes)),
            Self::File(path) => {
                let display = path.display().to_string();
                match tokio::fs::read(path).await {
                    Ok(bytes) => Ok(Arc::from(bytes)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(HashError::NotFound(display))
                    }
                    Err(source) => Err(HashError::Io {
                        path: display,
                        source,
                    }),
                }
            }
        }
    }
}

/// SHA-256 digest of raw image bytes, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an already computed key (e.g. one read back from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes of one image plus its fingerprint, computed once per request.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Arc<[u8]>,
    pub hash: ContentHash,
}

impl LoadedImage {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Read the image and compute its content hash.
pub async fn hash(image: &ImageHandle) -> Result<ContentHash, HashError> {
    load(image).await.map(|loaded| loaded.hash)
}

/// Read the image and compute its content hash, keeping the bytes.
pub async fn load(image: &ImageHandle) -> Result<LoadedImage, HashError> {
    let bytes = image.read().await.inspect_err(|e| {
        warn!(error = %e, "Failed to read image for hashing");
    })?;
    let hash = ContentHash::from_bytes(&bytes);
    debug!(hash = %hash, size = bytes.len(), "Computed image content hash");
    Ok(LoadedImage { bytes, hash })
}
