//! Existence probing.

use std::io;
use std::path::Path;

/// Read-only existence check used by the resolver.
///
/// Absence is `Ok(false)`. Only failures unrelated to non-existence
/// (permission denied, I/O errors) are `Err`.
pub trait ExistenceProbe: Send + Sync + std::fmt::Debug {
    fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ExistenceProbe for FsProbe {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        fallback_util::fs::path_exists(path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fs_probe() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("index.js");
        std::fs::write(&file, "").unwrap();

        assert!(FsProbe.exists(&file).unwrap());
        assert!(!FsProbe.exists(&dir.path().join("nope.js")).unwrap());
    }
}
