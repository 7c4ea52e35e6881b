//! List the contents of an asar container.
//!
//! ```sh
//! cargo run --example dump -- path/to/app.asar
//! ```

use anyhow::{Context, Result};
use asar_vfs::{Archive, Stats};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: dump <archive.asar>")?;

    let archive = Archive::open(&path).with_context(|| format!("failed to open {path}"))?;
    println!("{} (header: {} bytes)", path, archive.header_size());
    walk(&archive, "", 1)?;
    Ok(())
}

fn walk(archive: &Archive, dir: &str, depth: usize) -> Result<()> {
    let mut names = archive.readdir(dir)?;
    names.sort();

    for name in names {
        let child = if dir.is_empty() {
            name.clone()
        } else {
            format!("{dir}/{name}")
        };
        let indent = "  ".repeat(depth);

        match archive.stat(&child)? {
            Stats::Directory => {
                println!("{indent}{name}/");
                walk(archive, &child, depth + 1)?;
            }
            Stats::Link => {
                let target = archive.realpath(&child)?;
                println!("{indent}{name} -> {}", target.display());
            }
            Stats::File(info) => {
                let unpacked = if info.unpacked { ", unpacked" } else { "" };
                println!("{indent}{name} ({} bytes{unpacked})", info.size);
            }
        }
    }
    Ok(())
}
