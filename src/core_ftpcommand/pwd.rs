use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PWD FTP command: reports the session's working directory.
pub async fn handle_pwd_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
) -> Result<(), std::io::Error> {
    let current_dir = session.lock().await.current_dir.clone();
    let response = format!("257 \"{}\" is the current directory.\r\n", current_dir);
    send_response(&writer, response.as_bytes()).await
}
