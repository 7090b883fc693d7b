use std::{io, path::{Path, PathBuf}};
use mime_guess::Mime;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::fs;

/// Served when a request resolves to a directory.
pub const INDEX_FILE: &str = "index.html";

/// Errors returned while resolving a static asset.
#[derive(Debug, Error)]
pub enum StaticError {
    #[error("no such file")]
    NotFound,

    #[error("path escapes the static root")]
    OutsideRoot,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for StaticError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StaticError::NotFound,
            _ => StaticError::Io(e),
        }
    }
}

/// A file read from the static root.
#[derive(Debug)]
pub struct Asset {
    pub path:  PathBuf,
    pub bytes: Vec<u8>,
}

impl Asset {
    /// Guessed from the file extension, `application/octet-stream` otherwise.
    pub fn content_type(&self) -> Mime {
        mime_guess::from_path(&self.path).first_or_octet_stream()
    }
}

/// Reads the file that the percent-encoded `request_path` names under `root`.
///
/// The path is decoded first, then both sides are canonicalized and the
/// target must stay under the root, so `..` segments (encoded or not) and
/// symlinks pointing outside are refused.
pub async fn load(root: &Path, request_path: &str) -> Result<Asset, StaticError> {
    let path = resolve(root, request_path).await?;
    let bytes = fs::read(&path).await?;
    Ok(Asset { path, bytes })
}

/// Canonical path of the file `request_path` names under `root`.
pub async fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, StaticError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| StaticError::NotFound)?;
    if decoded.contains('\0') {
        return Err(StaticError::NotFound);
    }

    let root = fs::canonicalize(root).await?;
    let relative = decoded.trim_start_matches('/');

    let mut target = contained(&root, root.join(relative)).await?;
    if fs::metadata(&target).await?.is_dir() {
        target = contained(&root, target.join(INDEX_FILE)).await?;
    }
    Ok(target)
}

async fn contained(root: &Path, candidate: PathBuf) -> Result<PathBuf, StaticError> {
    let canonical = fs::canonicalize(&candidate).await?;
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StaticError::OutsideRoot)
    }
}
