use crate::core_auth::CredentialTable;
use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, SessionState};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASS FTP command.
///
/// Verifies the password against the credential table for the username given
/// by the preceding USER. On a mismatch the session stays in the name-given
/// state and the client may retry.
pub async fn handle_pass_command(
    writer: ControlWriter,
    credentials: Arc<CredentialTable>,
    session: Arc<Mutex<Session>>,
    password: String,
) -> Result<(), std::io::Error> {
    let (state, username) = {
        let session = session.lock().await;
        (session.state, session.username.clone())
    };

    if state != SessionState::NameGiven {
        return send_response(&writer, b"530 Login with USER first.\r\n").await;
    }

    let username = username.unwrap_or_default();
    if credentials.is_empty() {
        warn!("No user information available");
        return send_response(&writer, b"530 Login incorrect.\r\n").await;
    }

    if credentials.verify(&username, &password) {
        session.lock().await.state = SessionState::Authenticated;
        info!("User {} logged in", username);
        send_response(&writer, b"230 User logged in, proceed.\r\n").await
    } else {
        warn!("Login failed for user {}", username);
        send_response(&writer, b"530 Login incorrect.\r\n").await
    }
}
