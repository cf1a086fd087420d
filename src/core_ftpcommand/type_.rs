use crate::helpers::{send_response, ControlWriter};

/// Handles the TYPE FTP command.
///
/// Binary is the only supported mode; the argument is accepted but not
/// interpreted.
pub async fn handle_type_command(writer: ControlWriter) -> Result<(), std::io::Error> {
    send_response(&writer, b"200 Type set to I\r\n").await
}
