//! Process-wide archive cache and container-boundary detection.
//!
//! Archives are parsed once per container path and shared for the life of
//! the process; containers are assumed immutable while the process runs, so
//! nothing is ever evicted or invalidated. The same applies to the
//! directory-probe cache used while locating container boundaries.
//!
//! Both caches live behind an explicit [`ArchiveRegistry`] handle rather
//! than hidden module state: production code uses the
//! [`ArchiveRegistry::global`] instance, tests construct their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::archive::Archive;
use crate::error::Result;

/// Extension that marks a path segment as a container candidate.
pub const ASAR_EXTENSION: &str = "asar";

static GLOBAL: OnceLock<ArchiveRegistry> = OnceLock::new();

/// Cache of open archives keyed by container path, plus the directory-probe
/// cache consulted during boundary detection.
#[derive(Default)]
pub struct ArchiveRegistry {
    archives: Mutex<HashMap<PathBuf, Arc<Archive>>>,
    directories: Mutex<HashMap<PathBuf, bool>>,
}

impl ArchiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry. Lives for the process lifetime.
    pub fn global() -> &'static ArchiveRegistry {
        GLOBAL.get_or_init(ArchiveRegistry::new)
    }

    /// Return the shared archive for `path`, opening and parsing it on first
    /// use. The guard is held across creation, so concurrent calls for the
    /// same container parse it exactly once. Failures are not cached; a
    /// later call retries, e.g. when the container appears on disk after the
    /// first attempt.
    pub fn get_or_create(&self, path: &Path) -> Result<Arc<Archive>> {
        let mut archives = self.archives.lock().unwrap();

        if let Some(archive) = archives.get(path) {
            return Ok(Arc::clone(archive));
        }

        let archive = Arc::new(Archive::open(path).map_err(|err| {
            tracing::debug!(path = %path.display(), %err, "archive failed to open");
            err
        })?);
        archives.insert(path.to_path_buf(), Arc::clone(&archive));
        Ok(archive)
    }

    /// Whether `path` is a real directory on disk. Probed lazily, cached for
    /// the process lifetime, never invalidated.
    pub fn is_directory(&self, path: &Path) -> bool {
        let mut directories = self.directories.lock().unwrap();

        if let Some(&cached) = directories.get(path) {
            return cached;
        }

        let is_dir = std::fs::metadata(path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        directories.insert(path.to_path_buf(), is_dir);
        is_dir
    }

    /// Determine whether `full_path` crosses into a container.
    ///
    /// Walks upward from `full_path`; the boundary is the first candidate
    /// (including `full_path` itself) whose extension is `asar` and which is
    /// not a real directory on disk. Returns the container path and the path
    /// relative to it, or `None` when the walk reaches the filesystem root
    /// without a boundary. The empty relative path (`full_path` *is* the
    /// container) is only reported when `allow_root` is set.
    pub fn split_path(&self, full_path: &Path, allow_root: bool) -> Option<(PathBuf, PathBuf)> {
        let mut iter = full_path;
        loop {
            let is_candidate = iter
                .extension()
                .map_or(false, |ext| ext == ASAR_EXTENSION);
            if is_candidate && !self.is_directory(iter) {
                break;
            }
            match iter.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => iter = parent,
                _ => return None,
            }
        }

        if iter == full_path {
            if allow_root {
                return Some((iter.to_path_buf(), PathBuf::new()));
            }
            return None;
        }

        let relative = full_path.strip_prefix(iter).ok()?.to_path_buf();
        Some((iter.to_path_buf(), relative))
    }
}
