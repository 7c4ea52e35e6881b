//! asar-vfs: read-only virtual filesystem over asar containers
//!
//! An asar container bundles a directory tree (files, directories,
//! symlinks, per-file metadata) into a single file: a JSON index embedded
//! in a pickle-framed header, followed by the raw file contents addressed by
//! offsets recorded in the index. This library provides:
//! - Header/index parsing into a typed tree ([`ContainerIndex`])
//! - Virtual path semantics: stat, readdir, realpath, file info, whole-file
//!   reads ([`Archive`])
//! - SHA-256 content integrity validation with a fail-closed contract
//!   ([`integrity`], [`AsarError::is_fatal`])
//! - Extraction of packed members to scoped temporary files
//!   ([`Archive::copy_file_out`])
//! - A process-wide archive cache and container-boundary detection for
//!   arbitrary paths ([`ArchiveRegistry`], [`vfs`])
//!
//! # Example
//!
//! ```no_run
//! use asar_vfs::Archive;
//!
//! let archive = Archive::open("app.asar")?;
//! let names = archive.readdir("")?;
//! let info = archive.get_file_info("lib/index.js")?;
//! let bytes = archive.read_file("lib/index.js")?;
//! # Ok::<(), asar_vfs::AsarError>(())
//! ```
//!
//! Archives are read-only and assumed immutable for the process lifetime.

// Core modules
pub mod archive;
pub mod error;
pub mod integrity;
pub mod registry;
pub mod temp;
pub mod vfs;

// Re-export commonly used types
pub use archive::{parse_header, Archive, ContainerIndex, FileInfo, FileType, Node, Stats};
pub use error::{AsarError, Result};
pub use integrity::{HashAlgorithm, IntegrityPayload};
pub use registry::{ArchiveRegistry, ASAR_EXTENSION};
pub use temp::ScopedTempFile;
