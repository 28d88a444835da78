//! Scoped scratch storage for decoded audio.
//!
//! Every decoded window is written to a [`ScratchFile`] inside the run's
//! [`ScratchDir`]. Both are removed on drop, so success, error, timeout
//! and cancellation paths all release their files.

use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempDir};
use tracing::debug;

use crate::error::MediaResult;

/// Per-run scratch directory.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `base` (created if missing).
    pub fn new_in(base: impl AsRef<Path>) -> MediaResult<Self> {
        let base = base.as_ref();
        std::fs::create_dir_all(base)?;
        let dir = Builder::new().prefix("tracklang-").tempdir_in(base)?;
        debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a new scratch file whose name starts with `prefix`.
    pub fn file(&self, prefix: &str) -> MediaResult<ScratchFile> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(".pcm")
            .tempfile_in(self.dir.path())?;
        Ok(ScratchFile { file })
    }
}

/// A scratch file deleted when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create a scratch file directly inside `dir`.
    pub fn new_in(dir: impl AsRef<Path>, prefix: &str) -> MediaResult<Self> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(".pcm")
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete now, reporting failures instead of swallowing them on drop.
    pub fn remove(self) -> MediaResult<PathBuf> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_file_removed_on_drop() {
        let scratch = ScratchDir::new_in(std::env::temp_dir()).unwrap();
        let file = scratch.file("track0_s0_").unwrap();
        let path = file.path().to_path_buf();
        std::fs::write(&path, b"pcm").unwrap();
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let scratch = ScratchDir::new_in(std::env::temp_dir()).unwrap();
        let dir = scratch.path().to_path_buf();
        let _file = scratch.file("x").unwrap();
        assert!(dir.exists());

        drop(_file);
        drop(scratch);
        assert!(!dir.exists());
    }

    #[test]
    fn test_explicit_remove() {
        let dir = tempfile::tempdir().unwrap();
        let file = ScratchFile::new_in(dir.path(), "vad_").unwrap();
        let path = file.remove().unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
