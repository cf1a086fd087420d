use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, SessionState};
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the USER FTP command.
///
/// Records the username on the session and requests the password. Accepted in
/// any state; re-issuing USER restarts the login exchange.
pub async fn handle_user_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    username: String,
) -> Result<(), std::io::Error> {
    info!("Received USER command with username: {}", username);

    {
        let mut session = session.lock().await;
        session.username = Some(username);
        session.state = SessionState::NameGiven;
    }

    send_response(&writer, b"331 User name okay, need password.\r\n").await
}
