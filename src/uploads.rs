use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Filesystem store for brand logos and product images.
///
/// Writes happen in two phases so a failed store mutation never leaves a
/// committed file behind: `stage` writes the bytes under `staging/` with a
/// fresh opaque name, and only after the referencing row is persisted does
/// `commit` rename the file into the public directory. A mutation that
/// fails after staging calls `discard` instead.
///
/// Replacing an image does not remove the previous file.
#[derive(Clone)]
pub struct UploadStore {
    public_dir: PathBuf,
    staging_dir: PathBuf,
}

#[derive(Debug)]
pub struct StagedUpload {
    filename: String,
    path: PathBuf,
}

impl StagedUpload {
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl UploadStore {
    pub async fn open(root: &Path) -> AppResult<Self> {
        let public_dir = root.to_path_buf();
        let staging_dir = root.join("staging");
        fs::create_dir_all(&staging_dir).await?;
        Ok(Self {
            public_dir,
            staging_dir,
        })
    }

    pub async fn stage(&self, original_name: &str, data: &[u8]) -> AppResult<StagedUpload> {
        let filename = opaque_name(original_name);
        let path = self.staging_dir.join(&filename);
        fs::write(&path, data).await?;
        Ok(StagedUpload { filename, path })
    }

    /// Move a staged file into the public directory; returns the stored
    /// filename to be referenced by the row that was just written.
    pub async fn commit(&self, staged: StagedUpload) -> AppResult<String> {
        let target = self.public_dir.join(&staged.filename);
        fs::rename(&staged.path, &target).await?;
        Ok(staged.filename)
    }

    pub async fn discard(&self, staged: StagedUpload) {
        if let Err(err) = fs::remove_file(&staged.path).await {
            tracing::warn!(error = %err, path = %staged.path.display(), "failed to drop staged upload");
        }
    }

    /// Path of a committed upload. Rejects anything that could escape the
    /// public directory.
    pub fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(AppError::NotFound);
        }
        Ok(self.public_dir.join(filename))
    }
}

/// Collision-free stored name: a fresh UUID carrying over the original
/// extension when it looks like one.
fn opaque_name(original: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn extension_of(original: &str) -> Option<String> {
    let (_, ext) = original.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_names_keep_the_extension() {
        let name = opaque_name("logo.PNG");
        assert!(name.ends_with(".png"));
        assert!(!name.contains("logo"));
    }

    #[test]
    fn opaque_names_drop_suspicious_extensions() {
        assert!(!opaque_name("noext").contains('.'));
        assert!(!opaque_name("weird.ex?t").contains('.'));
        assert!(!opaque_name("trailing.").contains('.'));
    }

    #[test]
    fn opaque_names_do_not_collide() {
        assert_ne!(opaque_name("a.jpg"), opaque_name("a.jpg"));
    }

    #[tokio::test]
    async fn resolve_rejects_path_traversal() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::open(&root).await.unwrap();
        assert!(store.resolve("../secret").is_err());
        assert!(store.resolve("a/b.png").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("ok.png").is_ok());
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn stage_then_commit_moves_the_file() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::open(&root).await.unwrap();

        let staged = store.stage("photo.jpg", b"bytes").await.unwrap();
        let staged_path = root.join("staging").join(staged.filename());
        assert!(staged_path.exists());

        let filename = store.commit(staged).await.unwrap();
        assert!(root.join(&filename).exists());
        assert!(!staged_path.exists());
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn discard_drops_the_staged_file() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::open(&root).await.unwrap();

        let staged = store.stage("photo.jpg", b"bytes").await.unwrap();
        let staged_path = root.join("staging").join(staged.filename());
        store.discard(staged).await;
        assert!(!staged_path.exists());
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
