//! Static file lookup.

use std::io;
use std::path::{Path, PathBuf};

/// Source of static file bodies, keyed by request path.
pub trait AssetSource: Send + Sync {
    /// Contents of `path`, or `None` if there is nothing to serve.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FsAssets {
    /// Missing files, directories and empty files all read as `None`.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let full = self.root.join(path.trim_start_matches('/'));
        if !full.is_file() {
            return Ok(None);
        }
        match std::fs::read(&full) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Content type by file extension.
pub fn mime_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type("/index.html"), "text/html");
        assert_eq!(mime_type("/css/site.CSS"), "text/css");
        assert_eq!(mime_type("/app.js"), "application/javascript");
        assert_eq!(mime_type("/robots.txt"), "text/plain");
        assert_eq!(mime_type("/LICENSE"), "text/plain");
    }

    #[test]
    fn reads_files_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>shop</h1>").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();

        let assets = FsAssets::new(dir.path());
        assert_eq!(assets.read("/index.html").unwrap(), Some(b"<h1>shop</h1>".to_vec()));
        assert_eq!(assets.read("/missing.html").unwrap(), None);
        assert_eq!(assets.read("/empty.txt").unwrap(), None);
        assert_eq!(assets.read("/css").unwrap(), None);
    }
}
