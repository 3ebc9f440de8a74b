//! `FileSystem` collaborator interface (spec §6), used by the permission
//! engine's persistence and by file-operation tool handlers so both are
//! testable without touching the real disk.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    async fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
    async fn mkdir_all(&self, path: &Path) -> io::Result<()>;
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
    async fn remove(&self, path: &Path) -> io::Result<()>;

    fn is_not_found(&self, err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::NotFound
    }
}

/// Default implementation backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

#[async_trait::async_trait]
impl FileSystem for RealFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await
    }

    async fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            out.push(entry.path());
        }
        Ok(out)
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        }
    }
}

/// In-memory filesystem double for tests.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .expect("lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .expect("lock poisoned")
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    async fn mkdir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .expect("lock poisoned")
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.files.lock().expect("lock poisoned").remove(path);
        Ok(())
    }
}
