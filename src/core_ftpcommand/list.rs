use crate::core_fs;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the LIST FTP command.
///
/// Enumerates the session's working directory (or a path below it) and sends
/// the listing over the control channel between the 150 and 226 replies.
pub async fn handle_list_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let dir = session.lock().await.resolve_path(&arg);

    let entries = match core_fs::read_dir_entries(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to open directory {:?}: {}", dir, e);
            return send_response(&writer, b"550 Failed to open directory.\r\n").await;
        }
    };

    send_response(&writer, b"150 Here comes the directory listing.\r\n").await?;

    let mut listing = String::new();
    for entry in &entries {
        listing.push_str(&core_fs::format_entry(entry));
    }
    send_response(&writer, listing.as_bytes()).await?;

    info!("Sent listing of {:?} ({} entries)", dir, entries.len());
    send_response(&writer, b"226 Directory send OK.\r\n").await
}
