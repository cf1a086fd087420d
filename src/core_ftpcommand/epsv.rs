use crate::helpers::{send_response, ControlWriter};

/// Handles the EPSV FTP command. Extended passive mode is not provided;
/// clients must fall back to PASV.
pub async fn handle_epsv_command(writer: ControlWriter) -> Result<(), std::io::Error> {
    send_response(&writer, b"500 EPSV not supported.\r\n").await
}
