use crate::core_fs;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// Handles the RETR (and GET) FTP command.
///
/// Requires a pending passive channel from an earlier PASV. The file is
/// stat'ed first so the 150 reply can announce the byte count, then exactly
/// one data connection is accepted and the file streamed over it in blocks.
/// The channel is retired on every path, success or failure.
pub async fn handle_retr_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    if arg.trim().is_empty() {
        warn!("RETR command received with no arguments");
        return send_response(&writer, b"501 Syntax error in parameters or arguments.\r\n").await;
    }

    // Taking the channel here clears it regardless of how the transfer ends.
    let channel = session.lock().await.data_channel.take();
    let Some(channel) = channel else {
        return send_response(&writer, b"425 Use PASV first.\r\n").await;
    };

    let path = session.lock().await.resolve_path(&arg);
    let (mut file, size) = match core_fs::open_for_read(&path).await {
        Ok(opened) => opened,
        Err(e) => {
            error!("File not found or could not be opened: {:?}: {}", path, e);
            return send_response(&writer, b"550 File not found.\r\n").await;
        }
    };

    let opening = format!(
        "150 Opening BINARY mode data connection for {} bytes\r\n",
        size
    );
    send_response(&writer, opening.as_bytes()).await?;

    let mut data_stream = match channel.accept_transfer().await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to accept data connection: {}", e);
            return send_response(&writer, b"425 Cannot open data connection.\r\n").await;
        }
    };

    let mut buffer = vec![0u8; 8192];
    let mut total_sent: u64 = 0;
    loop {
        let bytes_read = match file.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                error!("Error reading file {:?}: {}", path, e);
                let _ = data_stream.shutdown().await;
                return send_response(&writer, b"550 Error reading file.\r\n").await;
            }
        };
        if let Err(e) = data_stream.write_all(&buffer[..bytes_read]).await {
            error!("Error sending file data: {}", e);
            break;
        }
        total_sent += bytes_read as u64;
    }

    let _ = data_stream.shutdown().await;
    info!("Sent {:?} ({} of {} bytes)", path, total_sent, size);
    send_response(&writer, b"226 Transfer complete.\r\n").await
}
