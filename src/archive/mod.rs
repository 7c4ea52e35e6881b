mod format;
mod index;
mod reader;

pub use format::{parse_header, SIZE_RECORD_LEN};
pub use index::{ContainerIndex, FileInfo, FileType, Node, Stats};
pub use reader::Archive;
