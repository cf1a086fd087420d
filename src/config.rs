use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_port: u16,
    /// Address advertised to clients in 227 replies.
    pub pasv_address: String,
    /// Filesystem root all sessions are confined under.
    pub root_dir: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Static credential table, username to password. An empty table means
    /// every PASS is rejected.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

fn default_greeting() -> String {
    "Welcome to the FTP server".to_string()
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}
