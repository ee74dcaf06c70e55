//! Uploaded payment proofs.
//!
//! The storefront writes proofs to the shared upload directory as
//! `{unix_millis}-{random}.{png|jpg}`. Anything that does not look like one
//! of those names is refused before the filesystem is touched, which keeps
//! requests from reaching outside the directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Longest stored name the storefront can produce, with headroom.
const MAX_NAME_LEN: usize = 64;

/// Errors from resolving a proof name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("invalid proof file name")]
    InvalidName,

    #[error("unsupported proof file type")]
    UnsupportedType,
}

/// A proof on disk and the content type to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofFile {
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// Map a requested proof name to a file under `upload_dir`.
///
/// # Errors
///
/// Returns `ProofError::InvalidName` for names with separators, dot
/// segments, or unexpected characters, and `ProofError::UnsupportedType`
/// for anything but PNG or JPEG.
pub fn resolve_proof(upload_dir: &Path, name: &str) -> Result<ProofFile, ProofError> {
    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.starts_with('.')
        || name.contains("..")
        || !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
        return Err(ProofError::InvalidName);
    }

    let content_type = match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => return Err(ProofError::UnsupportedType),
    };

    Ok(ProofFile {
        path: upload_dir.join(name),
        content_type,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_stored_names() {
        let dir = Path::new("/srv/uploads");
        let proof = resolve_proof(dir, "1717232400000-3735928559.png").unwrap();
        assert_eq!(proof.path, dir.join("1717232400000-3735928559.png"));
        assert_eq!(proof.content_type, "image/png");

        let proof = resolve_proof(dir, "1717232400000-42.JPG").unwrap();
        assert_eq!(proof.content_type, "image/jpeg");
    }

    #[test]
    fn test_rejects_traversal() {
        let dir = Path::new("/srv/uploads");
        for name in [
            "../secret.png",
            "..%2Fsecret.png",
            "a/b.png",
            "a\\b.png",
            ".hidden.png",
            "x..png",
            "",
        ] {
            assert_eq!(
                resolve_proof(dir, name),
                Err(ProofError::InvalidName),
                "{name}"
            );
        }
    }

    #[test]
    fn test_rejects_other_types() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(
            resolve_proof(dir, "1717232400000-1.gif"),
            Err(ProofError::UnsupportedType)
        );
        assert_eq!(
            resolve_proof(dir, "noextension"),
            Err(ProofError::UnsupportedType)
        );
    }
}
