use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use promptos::MemorySnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const SESSION_FILE: &str = "session.json";
const DEMO_FILE: &str = "demo.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// Files the CLI keeps between invocations: the bearer token and, in demo
/// mode, the in-memory service's data.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_session(&self) -> Result<Option<SavedSession>> {
        read_json(&self.root.join(SESSION_FILE))
    }

    pub fn save_session(&self, token: &str) -> Result<()> {
        let session = SavedSession {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        self.write_json(SESSION_FILE, &session)
    }

    pub fn clear_session(&self) -> Result<()> {
        remove_if_present(&self.root.join(SESSION_FILE))
    }

    pub fn load_demo(&self) -> Result<Option<MemorySnapshot>> {
        read_json(&self.root.join(DEMO_FILE))
    }

    pub fn save_demo(&self, snapshot: &MemorySnapshot) -> Result<()> {
        self.write_json(DEMO_FILE, snapshot)
    }

    pub fn clear_demo(&self) -> Result<()> {
        remove_if_present(&self.root.join(DEMO_FILE))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        let path = self.root.join(name);
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

fn remove_if_present(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
