use crate::core_network::pasv::DataChannel;
use crate::helpers::sanitize_input;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Authentication phase of one control connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Connected, no USER seen yet.
    New,
    /// USER received, waiting for PASS.
    NameGiven,
    /// Credentials accepted; filesystem commands allowed.
    Authenticated,
    /// Terminal, after QUIT or a fatal transport error.
    Closed,
}

/// Per-connection state. Owned and mutated only by the task processing that
/// connection; the registry keeps a reference for lookup and cleanup.
#[derive(Debug)]
pub struct Session {
    pub identity: IpAddr,
    pub state: SessionState,
    pub username: Option<String>,
    /// Current working directory, a `/`-rooted path under `base_path`.
    pub current_dir: String,
    pub base_path: PathBuf,
    /// Pending passive-mode listener, present only between a successful PASV
    /// and the next transfer. At most one per session.
    pub data_channel: Option<DataChannel>,
}

impl Session {
    pub fn new(identity: IpAddr, base_path: PathBuf) -> Self {
        Self {
            identity,
            state: SessionState::New,
            username: None,
            current_dir: String::from("/"),
            base_path,
            data_channel: None,
        }
    }

    /// Appends a path segment to the current working directory.
    pub fn change_dir(&mut self, segment: &str) {
        let segment = sanitize_input(segment);
        if segment.is_empty() {
            return;
        }
        if !self.current_dir.ends_with('/') {
            self.current_dir.push('/');
        }
        self.current_dir.push_str(&segment);
    }

    /// Resolves an argument against the session's working directory, rooted
    /// under the server's file root. Traversal sequences are stripped before
    /// joining.
    pub fn resolve_path(&self, arg: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        let cwd = self.current_dir.trim_start_matches('/');
        if !cwd.is_empty() {
            path.push(cwd);
        }
        let rel = sanitize_input(arg);
        if !rel.is_empty() {
            path.push(rel);
        }
        path
    }
}

/// Concurrency-safe collection of live sessions keyed by client identity.
/// All operations take a registry-wide critical section; at most one live
/// entry exists per identity at a time.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<IpAddr, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a session, returning the replaced entry if the identity was
    /// already present (a repeated connection from the same address).
    pub async fn register(
        &self,
        identity: IpAddr,
        session: Arc<Mutex<Session>>,
    ) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.insert(identity, session)
    }

    pub async fn lookup(&self, identity: &IpAddr) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.get(identity).cloned()
    }

    pub async fn remove(&self, identity: &IpAddr) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.remove(identity)
    }
}
