use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the LCD FTP command: appends a path segment to the session's
/// working directory.
pub async fn handle_lcd_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let current_dir = {
        let mut session = session.lock().await;
        session.change_dir(&arg);
        session.current_dir.clone()
    };
    info!("Working directory is now {}", current_dir);

    let response = format!("250 Directory changed to {}.\r\n", arg);
    send_response(&writer, response.as_bytes()).await
}
