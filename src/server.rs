use crate::config::Config;
use crate::core_auth::CredentialTable;
use crate::core_network::network;
use crate::session::SessionRegistry;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Binds the control port and runs the FTP server with the provided
/// configuration until the process is terminated.
pub async fn run(config: Config) -> Result<()> {
    info!("Starting server with config: {:?}", config.server);

    let listener = TcpListener::bind(("0.0.0.0", config.server.listen_port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind control port {}",
                config.server.listen_port
            )
        })?;

    let credentials = Arc::new(CredentialTable::new(config.users.clone()));
    let registry = Arc::new(SessionRegistry::new());

    network::start_server(listener, Arc::new(config), credentials, registry).await
}
