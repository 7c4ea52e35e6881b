use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::archive::format::{self, SIZE_RECORD_LEN};
use crate::archive::index::{ContainerIndex, FileInfo, Node, Stats, MAX_LINK_DEPTH};
use crate::error::{AsarError, Result};
use crate::integrity;
use crate::temp::ScopedTempFile;

/// An open asar container: the archive file, its decoded index, and the
/// per-archive memo of members already extracted to temp files.
///
/// Thread-safe once constructed: the index is immutable, file reads are
/// positioned, and the extraction memo carries its own locking.
pub struct Archive {
    path: PathBuf,
    file: File,
    header_size: u32,
    index: ContainerIndex,
    extracted: Mutex<HashMap<String, Arc<Mutex<Option<ScopedTempFile>>>>>,
}

impl Archive {
    /// Open a container and parse its header into the typed index.
    ///
    /// Every failure (unopenable file, truncated or over-declared frame,
    /// malformed index document) is a returned error; a constructed
    /// `Archive` always has a valid index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "failed to open archive");
            err
        })?;

        let mut record = [0u8; SIZE_RECORD_LEN];
        file.read_exact(&mut record).map_err(|_| {
            AsarError::InvalidFormat(format!("truncated size record: {}", path.display()))
        })?;
        let frame_len = format::header_frame_len(&record)?;

        // Reject a declared frame length past the end of the file before
        // allocating a buffer for it.
        let remaining = file.metadata()?.len().saturating_sub(SIZE_RECORD_LEN as u64);
        if u64::from(frame_len) > remaining {
            return Err(AsarError::InvalidFormat(format!(
                "header frame length {} exceeds container size: {}",
                frame_len,
                path.display()
            )));
        }

        let mut frame = vec![0u8; frame_len as usize];
        file.read_exact(&mut frame)?;
        let index = format::parse_index_frame(&frame).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "failed to parse archive header");
            err
        })?;

        Ok(Self {
            path,
            file,
            header_size: SIZE_RECORD_LEN as u32 + frame_len,
            index,
            extracted: Mutex::new(HashMap::new()),
        })
    }

    /// The container's filesystem path (the archive's identity).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total header size: the base all index offsets are relative to.
    pub fn header_size(&self) -> u32 {
        self.header_size
    }

    /// The decoded index tree.
    pub fn index(&self) -> &ContainerIndex {
        &self.index
    }

    /// Get the metadata of a file. A symlink at the final segment is
    /// followed transparently; directories and unresolvable paths fail.
    pub fn get_file_info(&self, path: &str) -> Result<FileInfo> {
        self.file_info_at_depth(path, 0)
    }

    fn file_info_at_depth(&self, path: &str, depth: usize) -> Result<FileInfo> {
        let node = self
            .index
            .node_at(path)
            .ok_or_else(|| AsarError::FileNotFound(path.to_string()))?;

        if let Node::Link { link } = node {
            if depth >= MAX_LINK_DEPTH {
                return Err(AsarError::FileNotFound(path.to_string()));
            }
            return self.file_info_at_depth(link, depth + 1);
        }

        FileInfo::from_node(node, self.header_size, path)
    }

    /// Stat a path: symlinks and directories report their type without any
    /// field validation, files report full metadata.
    pub fn stat(&self, path: &str) -> Result<Stats> {
        let node = self
            .index
            .node_at(path)
            .ok_or_else(|| AsarError::FileNotFound(path.to_string()))?;

        match node {
            Node::Link { .. } => Ok(Stats::Link),
            Node::Directory { .. } => Ok(Stats::Directory),
            Node::File { .. } => Ok(Stats::File(FileInfo::from_node(
                node,
                self.header_size,
                path,
            )?)),
        }
    }

    /// List the child names of a directory (or of a symlink to one). No
    /// ordering is guaranteed.
    pub fn readdir(&self, path: &str) -> Result<Vec<String>> {
        let node = self
            .index
            .node_at(path)
            .ok_or_else(|| AsarError::FileNotFound(path.to_string()))?;
        let files = self
            .index
            .files_of(node)
            .ok_or_else(|| AsarError::NotADirectory(path.to_string()))?;
        Ok(files.keys().cloned().collect())
    }

    /// Canonicalize a path: a symlink returns its raw target (not resolved
    /// further), anything else echoes the input.
    pub fn realpath(&self, path: &str) -> Result<PathBuf> {
        let node = self
            .index
            .node_at(path)
            .ok_or_else(|| AsarError::FileNotFound(path.to_string()))?;

        match node {
            Node::Link { link } => Ok(PathBuf::from(link)),
            _ => Ok(PathBuf::from(path)),
        }
    }

    /// Read a whole file out of the container.
    ///
    /// Packed contents are read at their recorded offset and validated
    /// against the integrity descriptor when one is present; unpacked files
    /// are read from their on-disk sidecar location.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let info = self.get_file_info(path)?;

        if info.unpacked {
            let real_path = self.copy_file_out(path)?;
            return Ok(std::fs::read(real_path)?);
        }

        let mut buf = vec![0u8; info.size as usize];
        read_exact_at(&self.file, &mut buf, info.offset)?;

        if let Some(payload) = &info.integrity {
            integrity::validate(&buf, payload)?;
        }

        Ok(buf)
    }

    /// Materialize a packed file as a real temporary file and return its
    /// path. Repeated calls for the same relative path return the same temp
    /// file; the copies live until the archive is dropped.
    ///
    /// For an unpacked file no copy is made; the returned path points into
    /// the `<container>.unpacked` sidecar directory.
    pub fn copy_file_out(&self, path: &str) -> Result<PathBuf> {
        let info = self.get_file_info(path)?;

        if info.unpacked {
            let mut sidecar = self.path.clone().into_os_string();
            sidecar.push(".unpacked");
            return Ok(PathBuf::from(sidecar).join(path));
        }

        // Per-path slot: same-path callers serialize and reuse one temp
        // file, distinct paths extract concurrently, and the map guard is
        // released before any I/O happens.
        let slot = {
            let mut extracted = self.extracted.lock().unwrap();
            Arc::clone(extracted.entry(path.to_string()).or_default())
        };
        let mut slot = slot.lock().unwrap();
        if let Some(tmp) = slot.as_ref() {
            return Ok(tmp.path().to_path_buf());
        }

        let mut buf = vec![0u8; info.size as usize];
        read_exact_at(&self.file, &mut buf, info.offset)?;

        if let Some(payload) = &info.integrity {
            integrity::validate(&buf, payload)?;
        }

        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        let tmp = ScopedTempFile::with_contents(extension, &buf)?;
        if info.executable {
            tmp.set_executable()?;
        }

        let out = tmp.path().to_path_buf();
        tracing::debug!(path, out = %out.display(), "extracted archive member");
        *slot = Some(tmp);
        Ok(out)
    }

    /// Direct access to the archive's open file.
    ///
    /// Reads through this handle bypass integrity validation entirely;
    /// callers take responsibility for verifying whatever they read.
    pub fn unsafe_file(&self) -> &File {
        &self.file
    }

    /// Raw descriptor of the archive file. Same caveat as
    /// [`Archive::unsafe_file`]: no integrity validation.
    #[cfg(unix)]
    pub fn unsafe_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self.file.as_raw_fd()
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("header_size", &self.header_size)
            .finish_non_exhaustive()
    }
}

/// Positioned read: fill `buf` from `offset` without touching the shared
/// file cursor, so concurrent reads do not race.
#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
