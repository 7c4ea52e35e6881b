#![no_main]

use asar_vfs::parse_header;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must fail cleanly, never panic or over-read.
    let Ok((header_size, index)) = parse_header(data) else {
        return;
    };
    let _ = header_size;

    // Exercise resolution against whatever tree survived parsing.
    let _ = index.node_at("");
    let _ = index.node_at("a/b/c");
    let _ = index.node_at("../../../etc/passwd");
    let _ = index.node_at("a//b");

    if let Some(root) = index.files_of(index.root()) {
        for (name, node) in root {
            let _ = index.node_at(name);
            let _ = index.files_of(node);
        }
    }
});
