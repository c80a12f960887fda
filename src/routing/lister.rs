//! Directory listing collaborator.

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Lists the entries of a directory.
///
/// Implementations return entries in whatever order the backing store
/// yields them; callers must not rely on sorting.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, directory: &Path) -> io::Result<Vec<DirEntry>>;
}

/// Lists directories on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

#[async_trait]
impl DirectoryLister for FsLister {
    async fn list(&self, directory: &Path) -> io::Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(directory).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().await?.is_dir(),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_lister() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("nested")).unwrap();
        std::fs::write(root.path().join("a.rs"), "").unwrap();

        let mut entries = FsLister.list(root.path()).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries, vec![DirEntry::file("a.rs"), DirEntry::dir("nested")]);
    }

    #[tokio::test]
    async fn test_fs_lister_missing_directory() {
        let err = FsLister
            .list(Path::new("/definitely/not/a/routes/dir"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
