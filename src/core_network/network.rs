use crate::config::Config;
use crate::core_auth::CredentialTable;
use crate::core_ftpcommand::handlers::dispatch;
use crate::core_parser;
use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, SessionRegistry, SessionState};
use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Accepts control connections on `listener` and spawns one session task per
/// connection. Task handles are tracked in a [`JoinSet`]; finished tasks are
/// reaped on every accept.
pub async fn start_server(
    listener: TcpListener,
    config: Arc<Config>,
    credentials: Arc<CredentialTable>,
    registry: Arc<SessionRegistry>,
) -> Result<()> {
    info!("Server listening on {}", listener.local_addr()?);

    let mut connections = JoinSet::new();
    loop {
        let (socket, addr) = listener.accept().await?;
        info!("New connection from {}", addr);

        let config = Arc::clone(&config);
        let credentials = Arc::clone(&credentials);
        let registry = Arc::clone(&registry);
        connections.spawn(async move {
            if let Err(e) = handle_connection(socket, config, credentials, registry).await {
                warn!("Connection error for {}: {:?}", addr, e);
            }
            info!("Connection closed for {}", addr);
        });

        while connections.try_join_next().is_some() {}
    }
}

/// Runs one control connection: registers the session, drives the command
/// loop, and deregisters on every exit path. Both sockets close when the
/// halves are dropped on return.
pub async fn handle_connection(
    socket: TcpStream,
    config: Arc<Config>,
    credentials: Arc<CredentialTable>,
    registry: Arc<SessionRegistry>,
) -> Result<()> {
    let identity = socket.peer_addr()?.ip();
    let base_path = PathBuf::from(&config.server.root_dir);
    let session = Arc::new(Mutex::new(Session::new(identity, base_path)));

    if registry
        .register(identity, Arc::clone(&session))
        .await
        .is_some()
    {
        warn!("Replacing stale session entry for {}", identity);
    }

    let (read_half, write_half) = socket.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));
    let mut reader = BufReader::new(read_half);

    let result = session_loop(&mut reader, &writer, &config, &credentials, &session).await;
    registry.remove(&identity).await;
    result
}

async fn session_loop(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &ControlWriter,
    config: &Arc<Config>,
    credentials: &Arc<CredentialTable>,
    session: &Arc<Mutex<Session>>,
) -> Result<()> {
    let greeting = format!("220 {}\r\n", config.server.greeting);
    send_response(writer, greeting.as_bytes()).await?;

    let mut buffer = String::new();
    loop {
        buffer.clear();
        let n = reader.read_line(&mut buffer).await?;
        if n == 0 {
            info!("Client disconnected");
            break;
        }
        info!("Received command: {}", buffer.trim_end());

        let command = core_parser::parse(&buffer);
        dispatch(
            Arc::clone(writer),
            Arc::clone(config),
            Arc::clone(credentials),
            Arc::clone(session),
            command,
        )
        .await?;

        if session.lock().await.state == SessionState::Closed {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::tcp::OwnedWriteHalf;

    async fn expect_line(reader: &mut BufReader<OwnedReadHalf>, code: &str) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(
            line.starts_with(code),
            "expected a {} reply, got {:?}",
            code,
            line
        );
        line
    }

    async fn send(writer: &mut OwnedWriteHalf, line: &str) {
        writer.write_all(line.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn full_session_round_trip() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("sample.txt"), b"hello from the server\n").unwrap();

        let config = Arc::new(Config {
            server: ServerConfig {
                listen_port: 0,
                pasv_address: "127.0.0.1".to_string(),
                root_dir: root.path().to_string_lossy().into_owned(),
                greeting: "Welcome to the FTP server".to_string(),
            },
            users: HashMap::from([("root".to_string(), "root".to_string())]),
        });
        let credentials = Arc::new(CredentialTable::new(config.users.clone()));
        let registry = Arc::new(SessionRegistry::new());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        {
            let config = Arc::clone(&config);
            let credentials = Arc::clone(&credentials);
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let _ = start_server(listener, config, credentials, registry).await;
            });
        }

        let control = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = control.into_split();
        let mut reader = BufReader::new(read_half);
        expect_line(&mut reader, "220").await;

        // Commands before login are refused and leave no trace.
        send(&mut write_half, "LIST\r\n").await;
        expect_line(&mut reader, "530").await;

        send(&mut write_half, "USER root\r\n").await;
        expect_line(&mut reader, "331").await;
        send(&mut write_half, "PASS root\r\n").await;
        expect_line(&mut reader, "230").await;

        send(&mut write_half, "PASV\r\n").await;
        let pasv = expect_line(&mut reader, "227").await;
        let open = pasv.find('(').unwrap() + 1;
        let close = pasv.find(')').unwrap();
        let (host, port) = core_parser::parse_address(&pasv[open..close]).unwrap();
        assert_eq!(host, "127.0.0.1");

        let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        send(&mut write_half, "RETR sample.txt\r\n").await;
        expect_line(&mut reader, "150").await;

        let mut payload = Vec::new();
        data.read_to_end(&mut payload).await.unwrap();
        assert_eq!(payload, b"hello from the server\n");
        expect_line(&mut reader, "226").await;

        send(&mut write_half, "QUIT\r\n").await;
        expect_line(&mut reader, "221").await;

        // The connection task deregisters the session on its way out.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let identity = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(registry.lookup(&identity).await.is_none());
    }
}
