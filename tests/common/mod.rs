//! Shared helpers for building asar containers.
//!
//! The crate is read-only by design, so fixtures are assembled by hand:
//! pickle-framed header carrying the JSON index, then the content region.

#![allow(dead_code)]

use std::io::Write;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Size-record bytes plus frame bytes, i.e. the base all index offsets are
/// relative to for a container built by [`build_container`].
pub fn header_size(index: &Value) -> u64 {
    16 + serde_json::to_string(index).unwrap().len() as u64
}

/// Assemble a container: 8-byte size record, pickle-framed JSON index,
/// content region.
pub fn build_container(index: &Value, content: &[u8]) -> Vec<u8> {
    let json = serde_json::to_string(index).unwrap();
    let frame_len = (8 + json.len()) as u32;

    let mut bytes = Vec::with_capacity(16 + json.len() + content.len());
    bytes.extend(4u32.to_le_bytes()); // size-record pickle payload length
    bytes.extend(frame_len.to_le_bytes());
    bytes.extend(((4 + json.len()) as u32).to_le_bytes()); // frame pickle payload length
    bytes.extend((json.len() as u32).to_le_bytes());
    bytes.extend(json.as_bytes());
    bytes.extend(content);
    bytes
}

/// Write a container to a temp file with the `.asar` extension.
pub fn write_container(index: &Value, content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("fixture-")
        .suffix(".asar")
        .tempfile()
        .unwrap();
    file.write_all(&build_container(index, content)).unwrap();
    file.flush().unwrap();
    file
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Integrity descriptor for `data` with a correct whole-file digest.
pub fn integrity_for(data: &[u8]) -> Value {
    serde_json::json!({
        "algorithm": "SHA256",
        "hash": sha256_hex(data),
        "blockSize": 4 * 1024 * 1024,
        "blocks": [sha256_hex(data)],
    })
}
