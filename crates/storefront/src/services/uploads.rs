//! Payment proof uploads.
//!
//! Proofs are screenshots of a UPI transfer. Only PNG and JPEG images up to
//! [`MAX_PROOF_BYTES`] are accepted; the file extension, the declared content
//! type, and the file signature must all agree on one of those.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Largest accepted proof.
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Errors from validating or storing a proof.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a payment screenshot")]
    Missing,

    #[error("Payment proof must be a PNG or JPEG image")]
    UnsupportedType,

    #[error("Payment proof must be at most 5 MB")]
    TooLarge,

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    fn from_extension(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// A proof as received from the checkout form.
#[derive(Debug)]
pub struct ProofUpload<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl ProofUpload<'_> {
    /// Check size and type.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Missing` for an empty file, `TooLarge` past the
    /// limit, and `UnsupportedType` when the name, declared type, or content
    /// is not a PNG or JPEG.
    pub fn validate(&self) -> Result<ImageKind, UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if self.bytes.len() > MAX_PROOF_BYTES {
            return Err(UploadError::TooLarge);
        }

        let by_name = ImageKind::from_extension(self.file_name);
        let by_type = ImageKind::from_content_type(self.content_type);
        let by_content = ImageKind::sniff(self.bytes);

        match (by_name, by_type, by_content) {
            (Some(a), Some(b), Some(c)) if a == b && b == c => Ok(c),
            _ => Err(UploadError::UnsupportedType),
        }
    }
}

/// A stored-file name: `{unix_millis}-{random}.{ext}`.
#[must_use]
pub fn stored_name(kind: ImageKind) -> String {
    let random: u32 = rand::rng().random();
    format!(
        "{}-{random:08x}.{}",
        Utc::now().timestamp_millis(),
        kind.extension()
    )
}

/// Where payment proofs are kept.
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Validate and persist a proof, returning its stored file name.
    async fn store(&self, upload: ProofUpload<'_>) -> Result<String, UploadError>;

    /// Remove a stored proof whose order was never created. Best effort.
    async fn discard(&self, name: &str);
}

/// Stores proofs as files in a local directory.
#[derive(Debug, Clone)]
pub struct LocalProofStore {
    dir: PathBuf,
}

impl LocalProofStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ProofStore for LocalProofStore {
    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    async fn store(&self, upload: ProofUpload<'_>) -> Result<String, UploadError> {
        let kind = upload.validate()?;
        let name = stored_name(kind);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), upload.bytes).await?;

        info!(file = %name, "Payment proof stored");
        Ok(name)
    }

    async fn discard(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            warn!(file = %name, error = %e, "Failed to discard payment proof");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0; 32]);
        bytes
    }

    fn jpeg() -> Vec<u8> {
        let mut bytes = JPEG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0xE0; 32]);
        bytes
    }

    #[test]
    fn test_accepts_png_and_jpeg() {
        let png = png();
        let upload = ProofUpload {
            file_name: "proof.PNG",
            content_type: "image/png",
            bytes: &png,
        };
        assert_eq!(upload.validate().unwrap(), ImageKind::Png);

        let jpeg = jpeg();
        let upload = ProofUpload {
            file_name: "proof.jpeg",
            content_type: "image/jpeg",
            bytes: &jpeg,
        };
        assert_eq!(upload.validate().unwrap(), ImageKind::Jpeg);
    }

    #[test]
    fn test_rejects_mismatched_or_unknown_types() {
        let png = png();
        for (name, content_type) in [
            ("proof.gif", "image/png"),
            ("proof.png", "application/pdf"),
            ("proof.jpg", "image/jpeg"),
            ("proof", "image/png"),
        ] {
            let upload = ProofUpload {
                file_name: name,
                content_type,
                bytes: &png,
            };
            assert!(
                matches!(upload.validate(), Err(UploadError::UnsupportedType)),
                "{name} / {content_type}"
            );
        }
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let empty = ProofUpload {
            file_name: "proof.png",
            content_type: "image/png",
            bytes: &[],
        };
        assert!(matches!(empty.validate(), Err(UploadError::Missing)));

        let mut big = png();
        big.resize(MAX_PROOF_BYTES + 1, 0);
        let upload = ProofUpload {
            file_name: "proof.png",
            content_type: "image/png",
            bytes: &big,
        };
        assert!(matches!(upload.validate(), Err(UploadError::TooLarge)));
    }

    #[test]
    fn test_stored_name_shape() {
        let name = stored_name(ImageKind::Jpeg);
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "jpg");
        let (millis, random) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), 8);
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalProofStore::new(dir.path().join("payments"));
        let png = png();

        let name = store
            .store(ProofUpload {
                file_name: "screenshot.png",
                content_type: "image/png",
                bytes: &png,
            })
            .await
            .unwrap();

        let written = std::fs::read(store.dir().join(&name)).unwrap();
        assert_eq!(written, png);

        store.discard(&name).await;
        assert!(!store.dir().join(&name).exists());
    }

    #[tokio::test]
    async fn test_local_store_rejects_invalid_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalProofStore::new(dir.path());

        let result = store
            .store(ProofUpload {
                file_name: "notes.txt",
                content_type: "text/plain",
                bytes: b"hello",
            })
            .await;

        assert!(matches!(result, Err(UploadError::UnsupportedType)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
