//! Scoped temporary files for extracted archive members.

use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// A uniquely named file in the system temp directory, removed (best effort)
/// when dropped.
///
/// Extracted archive members keep their original extension so the OS still
/// recognizes them once they live outside the container.
#[derive(Debug)]
pub struct ScopedTempFile {
    inner: NamedTempFile,
}

impl ScopedTempFile {
    /// Create an empty temp file. `extension` is the bare extension of the
    /// source file ("js", "node", ...), or empty for none.
    pub fn new(extension: &str) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("asar-");
        let suffix;
        if !extension.is_empty() {
            suffix = format!(".{extension}");
            builder.suffix(&suffix);
        }
        let inner = builder.tempfile()?;
        Ok(Self { inner })
    }

    /// Create a temp file holding `contents`.
    pub fn with_contents(extension: &str, contents: &[u8]) -> Result<Self> {
        let file = Self::new(extension)?;
        fs::write(file.path(), contents)?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Mark the file executable (`rwxr-xr-x`). No-op on non-Unix platforms.
    #[cfg(unix)]
    pub fn set_executable(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.path(), fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn set_executable(&self) -> Result<()> {
        Ok(())
    }
}
