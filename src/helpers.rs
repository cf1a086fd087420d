use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of a control connection, shared between the session loop and
/// the command handlers.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Sends a reply to the client over the control channel.
pub async fn send_response(
    writer: &ControlWriter,
    message: &[u8],
) -> Result<(), std::io::Error> {
    let mut writer = writer.lock().await;
    writer.write_all(message).await?;
    Ok(())
}

/// Sanitizes input to prevent directory traversal attacks and ensure paths are relative.
pub fn sanitize_input(input: &str) -> String {
    // Remove directory traversal sequences
    let sanitized_input = input.replace("../", "").replace("..\\", "");
    // Remove any leading slashes
    sanitized_input.trim_start_matches('/').to_string()
}
