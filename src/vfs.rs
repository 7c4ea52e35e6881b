//! Transparent file access over the process-global registry.
//!
//! Callers hand these functions ordinary absolute paths; paths that cross
//! into a container are served from the archive (with integrity validation),
//! everything else falls back to the real filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::Archive;
use crate::error::{AsarError, Result};
use crate::registry::ArchiveRegistry;

/// Split `full_path` into container path and archive-relative path, or
/// `None` when it does not cross into a container. See
/// [`ArchiveRegistry::split_path`].
pub fn split_path(full_path: &Path, allow_root: bool) -> Option<(PathBuf, PathBuf)> {
    ArchiveRegistry::global().split_path(full_path, allow_root)
}

/// Shared archive for `path` from the process-global registry.
pub fn get_or_create_archive(path: &Path) -> Result<Arc<Archive>> {
    ArchiveRegistry::global().get_or_create(path)
}

/// Read a whole file, whether it lives inside a container or on the real
/// filesystem.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let registry = ArchiveRegistry::global();

    let Some((container, relative)) = registry.split_path(path, false) else {
        return Ok(fs::read(path)?);
    };

    let archive = registry.get_or_create(&container)?;
    let relative = relative
        .to_str()
        .ok_or_else(|| AsarError::FileNotFound(path.display().to_string()))?;

    let info = archive.get_file_info(relative)?;
    if info.unpacked {
        // Unpacked members resolve to their real on-disk location.
        let real_path = archive.copy_file_out(relative)?;
        return read_file(&real_path);
    }

    archive.read_file(relative)
}

/// [`read_file`], decoded as UTF-8.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    Ok(String::from_utf8(read_file(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal container: pickle-framed JSON index plus content region.
    fn container_bytes(index: &serde_json::Value, content: &[u8]) -> Vec<u8> {
        let json = serde_json::to_string(index).unwrap();
        let mut bytes = Vec::new();
        bytes.extend(4u32.to_le_bytes());
        bytes.extend(((8 + json.len()) as u32).to_le_bytes());
        bytes.extend(((4 + json.len()) as u32).to_le_bytes());
        bytes.extend((json.len() as u32).to_le_bytes());
        bytes.extend(json.as_bytes());
        bytes.extend(content);
        bytes
    }

    #[test]
    fn reads_through_a_container_boundary() {
        let index = serde_json::json!({
            "files": {
                "f.txt": { "size": 5, "offset": "0" }
            }
        });
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("demo.asar");
        fs::write(&container, container_bytes(&index, b"hello")).unwrap();

        let data = read_file(&container.join("f.txt")).unwrap();
        assert_eq!(data, b"hello");

        let (boundary, relative) = split_path(&container.join("f.txt"), false).unwrap();
        assert_eq!(boundary, container);
        assert_eq!(relative.to_str().unwrap(), "f.txt");

        let archive = get_or_create_archive(&container).unwrap();
        assert_eq!(archive.read_file("f.txt").unwrap(), b"hello");
    }

    #[test]
    fn plain_files_fall_back_to_the_filesystem() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"plain contents").unwrap();

        let data = read_file(tmp.path()).unwrap();
        assert_eq!(data, b"plain contents");

        let text = read_file_to_string(tmp.path()).unwrap();
        assert_eq!(text, "plain contents");
    }

    #[test]
    fn missing_plain_file_reports_io_error() {
        let err = read_file(Path::new("/nonexistent/definitely/missing")).unwrap_err();
        assert!(matches!(err, AsarError::Io(_)));
    }
}
