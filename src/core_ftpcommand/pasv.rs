use crate::config::Config;
use crate::core_network::pasv::{format_pasv_reply, DataChannel};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{debug, error};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASV FTP command.
///
/// Opens a fresh passive data channel for the session and advertises the
/// configured address and the bound port in the 227 reply. Any pending,
/// unused channel from an earlier PASV is closed first.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
) -> Result<(), std::io::Error> {
    let pasv_ip: Ipv4Addr = config
        .server
        .pasv_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    if session.lock().await.data_channel.take().is_some() {
        debug!("Retired a pending passive channel");
    }

    match DataChannel::open_passive(Ipv4Addr::UNSPECIFIED) {
        Ok((channel, port)) => {
            session.lock().await.data_channel = Some(channel);
            let response = format_pasv_reply(pasv_ip, port);
            debug!("PASV response sent to client: {}", response.trim_end());
            send_response(&writer, response.as_bytes()).await
        }
        Err(e) => {
            error!("Failed to open passive listener: {}", e);
            send_response(&writer, b"425 Cannot open data connection.\r\n").await
        }
    }
}
