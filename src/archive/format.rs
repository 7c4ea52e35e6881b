//! Pickle-framed header decoding.
//!
//! An asar container starts with an 8-byte size record followed by a header
//! frame; both are pickle-encoded, meaning each is prefixed with a 4-byte
//! payload length of its own that the reader skips. The frame wraps a single
//! length-prefixed UTF-8 string holding the JSON index document. Every file
//! offset stored in that document is relative to the first byte after the
//! frame, so the total header size is recorded alongside the parsed index.
//!
//! This is a decoder for untrusted input: every read is bounds-checked and
//! every failure is a returned error, never a panic.

use crate::archive::index::{ContainerIndex, Node};
use crate::error::{AsarError, Result};

/// Byte length of the pickle payload-length prefix.
const PICKLE_HEADER_SIZE: usize = 4;

/// Byte length of the size record at the start of a container.
pub const SIZE_RECORD_LEN: usize = 8;

/// Cursor over a borrowed byte buffer, skipping the pickle payload-length
/// prefix. Reads never go past the end of the buffer.
pub(crate) struct PickleReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PickleReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: PICKLE_HEADER_SIZE,
        }
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(4)?)?;
        self.pos += 4;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub(crate) fn read_str(&mut self) -> Option<&'a str> {
        let len = self.read_u32()? as usize;
        let bytes = self.data.get(self.pos..self.pos.checked_add(len)?)?;
        self.pos += len;
        std::str::from_utf8(bytes).ok()
    }
}

/// Decode the header frame length from the container's 8-byte size record.
pub(crate) fn header_frame_len(record: &[u8]) -> Result<u32> {
    PickleReader::new(record)
        .read_u32()
        .ok_or_else(|| AsarError::InvalidFormat("truncated size record".to_string()))
}

/// Parse an `L`-byte header frame into the typed index tree.
pub(crate) fn parse_index_frame(frame: &[u8]) -> Result<ContainerIndex> {
    let text = PickleReader::new(frame)
        .read_str()
        .ok_or_else(|| AsarError::InvalidFormat("malformed header frame".to_string()))?;
    let root: Node = serde_json::from_str(text)?;
    Ok(ContainerIndex::new(root))
}

/// Parse a complete container header from raw bytes.
///
/// Returns the total header size (size record plus frame, the base every
/// index offset is relative to) and the decoded index. Fails when the size
/// record is short, the declared frame length exceeds the available bytes,
/// or the payload is not a well-formed index document.
pub fn parse_header(bytes: &[u8]) -> Result<(u32, ContainerIndex)> {
    let record = bytes
        .get(..SIZE_RECORD_LEN)
        .ok_or_else(|| AsarError::InvalidFormat("truncated size record".to_string()))?;
    let frame_len = header_frame_len(record)?;

    let frame = bytes[SIZE_RECORD_LEN..]
        .get(..frame_len as usize)
        .ok_or_else(|| {
            AsarError::InvalidFormat("header frame length exceeds container size".to_string())
        })?;
    let index = parse_index_frame(frame)?;

    Ok((SIZE_RECORD_LEN as u32 + frame_len, index))
}
