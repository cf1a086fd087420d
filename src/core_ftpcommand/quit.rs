use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, SessionState};
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the QUIT FTP command.
///
/// Marks the session closed and drops any pending data channel; the
/// connection task deregisters the session and closes both sockets once the
/// command loop sees the closed state.
pub async fn handle_quit_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
) -> Result<(), std::io::Error> {
    {
        let mut session = session.lock().await;
        session.state = SessionState::Closed;
        session.data_channel = None;
        info!(
            "User {} logged out",
            session.username.as_deref().unwrap_or("(none)")
        );
    }

    send_response(&writer, b"221 Goodbye.\r\n").await
}
