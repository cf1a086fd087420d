//! Filesystem boundary consumed by the command handlers: directory
//! enumeration and sequential file reads under the server root.

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// One directory entry as seen by the listing code.
#[derive(Debug)]
pub struct FsEntry {
    pub name: String,
    pub is_dir: bool,
    /// Byte size; 0 for anything that is not a regular file.
    pub size: u64,
    pub modified: SystemTime,
}

/// Enumerates a directory, sorted by name for stable listings.
pub fn read_dir_entries(dir: &Path) -> io::Result<Vec<FsEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let size = if metadata.is_file() { metadata.len() } else { 0 };
        entries.push(FsEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Formats one listing line the way `ls -l` would, close enough for common
/// clients: synthetic permissions, a literal link count and owner/group,
/// the size right-aligned, the mtime as `Mon DD HH:MM`, and the base name.
pub fn format_entry(entry: &FsEntry) -> String {
    let permissions = if entry.is_dir {
        "drwxr-xr-x"
    } else {
        "-rw-r--r--"
    };
    let modified: DateTime<Local> = entry.modified.into();
    format!(
        "{} 1 user group {:>10} {} {}\r\n",
        permissions,
        entry.size,
        modified.format("%b %d %H:%M"),
        entry.name
    )
}

/// Opens a file for a transfer and reports its size up front, so the 150
/// reply can announce the byte count before any data moves.
pub async fn open_for_read(path: &Path) -> io::Result<(tokio::fs::File, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    Ok((file, size))
}
