use crate::helpers::{send_response, ControlWriter};
use log::info;

/// Handles the SYST FTP command: reports the server's system type.
pub async fn handle_syst_command(writer: ControlWriter) -> Result<(), std::io::Error> {
    info!("Responding to SYST command with system type.");
    send_response(&writer, b"215 UNIX Type: L8\r\n").await
}
