//! Command dispatcher: routes a parsed command to the handler appropriate to
//! the session's current authentication phase.

use crate::config::Config;
use crate::core_auth::CredentialTable;
use crate::core_ftpcommand::{epsv, lcd, list, pass, pasv, pwd, quit, retr, syst, type_, user};
use crate::core_parser::{Command, FtpVerb};
use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, SessionState};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Filesystem and data-channel commands are only valid once the login
/// exchange has completed.
fn requires_auth(verb: FtpVerb) -> bool {
    matches!(
        verb,
        FtpVerb::LIST
            | FtpVerb::RETR
            | FtpVerb::PWD
            | FtpVerb::LCD
            | FtpVerb::SYST
            | FtpVerb::PASV
            | FtpVerb::TYPE
    )
}

/// Validates `command` against the session state and runs the matching
/// handler. Unauthenticated sessions get a 530 for gated commands with no
/// state change and no side effect.
pub async fn dispatch(
    writer: ControlWriter,
    config: Arc<Config>,
    credentials: Arc<CredentialTable>,
    session: Arc<Mutex<Session>>,
    command: Command,
) -> Result<(), std::io::Error> {
    if requires_auth(command.verb) {
        let state = session.lock().await.state;
        if state != SessionState::Authenticated {
            return send_response(&writer, b"530 Please login with USER and PASS.\r\n").await;
        }
    }

    match command.verb {
        FtpVerb::USER => user::handle_user_command(writer, session, command.arg).await,
        FtpVerb::PASS => pass::handle_pass_command(writer, credentials, session, command.arg).await,
        FtpVerb::LIST => list::handle_list_command(writer, session, command.arg).await,
        FtpVerb::RETR => retr::handle_retr_command(writer, session, command.arg).await,
        FtpVerb::PWD => pwd::handle_pwd_command(writer, session).await,
        FtpVerb::LCD => lcd::handle_lcd_command(writer, session, command.arg).await,
        FtpVerb::SYST => syst::handle_syst_command(writer).await,
        FtpVerb::TYPE => type_::handle_type_command(writer).await,
        FtpVerb::PASV => pasv::handle_pasv_command(writer, config, session).await,
        FtpVerb::QUIT => quit::handle_quit_command(writer, session).await,
        FtpVerb::EPSV => epsv::handle_epsv_command(writer).await,
        FtpVerb::ERROR => send_response(&writer, b"500 Unknown command.\r\n").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::core_network::pasv::DataChannel;
    use crate::core_parser::{self, parse};
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    fn test_config(root_dir: &str) -> Arc<Config> {
        Arc::new(Config {
            server: ServerConfig {
                listen_port: 0,
                pasv_address: "127.0.0.1".to_string(),
                root_dir: root_dir.to_string(),
                greeting: "test".to_string(),
            },
            users: HashMap::from([("alice".to_string(), "secret".to_string())]),
        })
    }

    fn test_session(root_dir: &str) -> Arc<Mutex<Session>> {
        Arc::new(Mutex::new(Session::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            PathBuf::from(root_dir),
        )))
    }

    /// Builds a real socket pair and returns the server-side control writer
    /// together with the client end for reading replies.
    async fn control_pair() -> (ControlWriter, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();
        let (_read_half, write_half) = server_side.into_split();
        (Arc::new(Mutex::new(write_half)), client)
    }

    async fn read_reply(client: &mut TcpStream) -> String {
        let mut buf = [0u8; 1024];
        let n = client.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    async fn run(
        writer: &ControlWriter,
        config: &Arc<Config>,
        session: &Arc<Mutex<Session>>,
        line: &str,
    ) {
        let credentials = Arc::new(CredentialTable::new(config.users.clone()));
        dispatch(
            Arc::clone(writer),
            Arc::clone(config),
            credentials,
            Arc::clone(session),
            parse(line),
        )
        .await
        .unwrap();
    }

    async fn authenticate(
        writer: &ControlWriter,
        config: &Arc<Config>,
        session: &Arc<Mutex<Session>>,
        client: &mut TcpStream,
    ) {
        run(writer, config, session, "USER alice").await;
        read_reply(client).await;
        run(writer, config, session, "PASS secret").await;
        read_reply(client).await;
        assert_eq!(session.lock().await.state, SessionState::Authenticated);
    }

    fn pasv_port(reply: &str) -> u16 {
        let open = reply.find('(').unwrap() + 1;
        let close = reply.find(')').unwrap();
        let (_, port) = core_parser::parse_address(&reply[open..close]).unwrap();
        port
    }

    #[tokio::test]
    async fn unauthenticated_list_is_refused_without_touching_the_filesystem() {
        let (writer, mut client) = control_pair().await;
        // A root that does not exist: if the handler ran, it would reply 550.
        let config = test_config("/does/not/exist");
        let session = test_session("/does/not/exist");

        run(&writer, &config, &session, "LIST").await;
        assert!(read_reply(&mut client).await.starts_with("530"));
        assert_eq!(session.lock().await.state, SessionState::New);
    }

    #[tokio::test]
    async fn user_then_correct_pass_authenticates() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");

        run(&writer, &config, &session, "USER alice").await;
        assert!(read_reply(&mut client).await.starts_with("331"));
        assert_eq!(session.lock().await.state, SessionState::NameGiven);

        run(&writer, &config, &session, "PASS secret").await;
        assert!(read_reply(&mut client).await.starts_with("230"));
        assert_eq!(session.lock().await.state, SessionState::Authenticated);
    }

    #[tokio::test]
    async fn wrong_password_stays_name_given() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");

        run(&writer, &config, &session, "USER alice").await;
        read_reply(&mut client).await;
        run(&writer, &config, &session, "PASS wrong").await;
        assert!(read_reply(&mut client).await.starts_with("530"));
        assert_eq!(session.lock().await.state, SessionState::NameGiven);
    }

    #[tokio::test]
    async fn pass_without_user_is_refused() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");

        run(&writer, &config, &session, "PASS secret").await;
        assert!(read_reply(&mut client).await.starts_with("530"));
        assert_eq!(session.lock().await.state, SessionState::New);
    }

    #[tokio::test]
    async fn pasv_twice_retires_the_first_listener() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");
        authenticate(&writer, &config, &session, &mut client).await;

        run(&writer, &config, &session, "PASV").await;
        let first_port = pasv_port(&read_reply(&mut client).await);

        run(&writer, &config, &session, "PASV").await;
        let second_port = pasv_port(&read_reply(&mut client).await);

        // The first listener is closed; only the second accepts connections.
        assert!(TcpStream::connect(("127.0.0.1", first_port)).await.is_err());
        assert!(TcpStream::connect(("127.0.0.1", second_port))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn retr_missing_file_replies_550_and_clears_the_channel() {
        let root = tempfile::tempdir().unwrap();
        let root_dir = root.path().to_string_lossy().into_owned();
        let (writer, mut client) = control_pair().await;
        let config = test_config(&root_dir);
        let session = test_session(&root_dir);
        authenticate(&writer, &config, &session, &mut client).await;

        let (channel, _port) = DataChannel::open_passive(Ipv4Addr::LOCALHOST).unwrap();
        session.lock().await.data_channel = Some(channel);

        run(&writer, &config, &session, "RETR missing.txt").await;
        assert!(read_reply(&mut client).await.starts_with("550"));
        assert!(session.lock().await.data_channel.is_none());
    }

    #[tokio::test]
    async fn retr_without_a_channel_replies_425() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");
        authenticate(&writer, &config, &session, &mut client).await;

        run(&writer, &config, &session, "RETR sample.txt").await;
        assert!(read_reply(&mut client).await.starts_with("425"));
    }

    #[tokio::test]
    async fn quit_closes_the_session_in_any_state() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");

        run(&writer, &config, &session, "QUIT").await;
        assert!(read_reply(&mut client).await.starts_with("221"));
        assert_eq!(session.lock().await.state, SessionState::Closed);
    }

    #[tokio::test]
    async fn epsv_is_always_unsupported() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");
        authenticate(&writer, &config, &session, &mut client).await;

        run(&writer, &config, &session, "EPSV").await;
        assert!(read_reply(&mut client).await.starts_with("500"));
    }

    #[tokio::test]
    async fn unrecognized_commands_reply_500() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");

        run(&writer, &config, &session, "NOOP").await;
        assert!(read_reply(&mut client).await.starts_with("500"));
    }

    #[tokio::test]
    async fn pwd_lcd_and_type_after_login() {
        let (writer, mut client) = control_pair().await;
        let config = test_config("/tmp");
        let session = test_session("/tmp");
        authenticate(&writer, &config, &session, &mut client).await;

        run(&writer, &config, &session, "PWD").await;
        let reply = read_reply(&mut client).await;
        assert!(reply.starts_with("257"));
        assert!(reply.contains("\"/\""));

        run(&writer, &config, &session, "LCD sub").await;
        assert!(read_reply(&mut client).await.starts_with("250"));
        assert_eq!(session.lock().await.current_dir, "/sub");

        run(&writer, &config, &session, "TYPE I").await;
        assert!(read_reply(&mut client).await.starts_with("200"));
    }
}
