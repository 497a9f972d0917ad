//! Blob store collaborator, used for profile pictures.

use std::{
    future::Future,
    path::{Component, Path, PathBuf},
};

use tracing::instrument;

use crate::StoreError;

/// Storage for opaque files addressed by a relative path.
pub trait BlobStore {
    /// Store `bytes` at `path` and return a URL to read them back.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Remove the blob stored at `path`.
    fn delete(&self, path: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Blob store writing files under a root directory.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` under the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        if path.trim().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        let absolute = tokio::fs::canonicalize(&target).await?;
        Ok(format!("file://{}", absolute.display()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target).await?;

        // Only the directory holding the file, and only once it is empty.
        if let Some(parent) = target.parent().filter(|p| *p != self.root.as_path()) {
            if let Err(err) = tokio::fs::remove_dir(parent).await {
                tracing::debug!("kept {}: {err}", parent.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_escaping_paths() {
        let store = LocalBlobStore::new("/tmp/blobs");
        assert!(store.resolve("avatars/a.png").is_ok());
        assert!(matches!(
            store.resolve("../etc/passwd"),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("avatars/./a.png").is_ok());
        assert!(store.resolve("").is_err());
    }
}
