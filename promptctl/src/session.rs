use std::sync::Arc;

use anyhow::Result;
use promptos::{
    AppStore, ClientConfig, Connection, MemoryBackend, MemorySnapshot, assistant_from_config,
};
use tracing::{debug, warn};

use crate::state::StateDir;

/// One CLI invocation's view of the service: the store plus whatever has to
/// be written back when the command finishes.
pub struct Session {
    pub store: AppStore,
    pub config: ClientConfig,
    state: StateDir,
    demo: Option<Arc<MemoryBackend>>,
}

impl Session {
    /// Picks the backend and restores the stored token. When `login_email`
    /// is given the stored token is ignored, so a stale demo token cannot
    /// force demo mode on a real login.
    pub async fn open(config: ClientConfig, login_email: Option<&str>) -> Result<Self> {
        let state = StateDir::new(&config.state_dir);
        let saved = match state.load_session() {
            Ok(saved) => saved,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "discarding unreadable session file");
                state.clear_session()?;
                None
            }
        };
        let stored_token = match login_email {
            Some(_) => None,
            None => saved.as_ref().map(|s| s.token.clone()),
        };

        let (connection, demo) = if Connection::wants_demo(stored_token.as_deref(), login_email) {
            let snapshot = state.load_demo()?.unwrap_or_else(MemorySnapshot::demo);
            let backend = Arc::new(MemoryBackend::new(snapshot));
            (Connection::demo_shared(Arc::clone(&backend)), Some(backend))
        } else {
            (Connection::live(&config)?, None)
        };
        debug!(mode = ?connection.mode, "backend selected");

        let assistant = assistant_from_config(&config.ai);
        let mut store = AppStore::new(connection, assistant);
        if let Some(token) = stored_token.as_deref() {
            if !store.restore(token).await {
                state.clear_session()?;
            }
        }

        Ok(Self {
            store,
            config,
            state,
            demo,
        })
    }

    pub fn state(&self) -> &StateDir {
        &self.state
    }

    /// Drops the demo data so the next demo login starts from the fixtures.
    pub fn discard_demo(&mut self) -> Result<()> {
        self.demo = None;
        self.state.clear_demo()
    }

    /// Writes the token (or its absence) and the demo data back to disk.
    pub fn persist(&self) -> Result<()> {
        if let Some(backend) = &self.demo {
            self.state.save_demo(&backend.snapshot())?;
        }
        match self.store.token() {
            Some(token) => self.state.save_session(token),
            None => self.state.clear_session(),
        }
    }
}
