//! Access to the remote prompt service.
//!
//! The rest of the crate only sees [`Backend`]. Which implementation sits
//! behind it is decided once, when a [`Connection`] is selected.

pub mod fixtures;
pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::{
    AuthSession, CreditReceipt, Notification, Prompt, PromptDraft, PromptPatch, Space, SpaceKind,
    User,
};

pub use http::HttpBackend;
pub use memory::{MemoryBackend, MemorySnapshot};

#[async_trait]
pub trait Backend: Send + Sync {
    /// Bearer token attached to every subsequent call.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession>;
    async fn current_user(&self) -> Result<User>;

    async fn deduct_credit(&self) -> Result<CreditReceipt>;
    async fn reward_credits(&self, amount: u32) -> Result<CreditReceipt>;

    async fn create_space(&self, name: &str, kind: SpaceKind) -> Result<Space>;
    async fn update_space(&self, id: &str, name: &str, description: &str) -> Result<Space>;
    async fn delete_space(&self, id: &str) -> Result<()>;
    async fn my_spaces(&self) -> Result<Vec<Space>>;
    async fn join_space(&self, code: &str) -> Result<Space>;

    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt>;
    async fn prompts_in_space(&self, space_id: &str) -> Result<Vec<Prompt>>;
    async fn update_prompt(&self, id: &str, patch: &PromptPatch) -> Result<Prompt>;
    async fn delete_prompt(&self, id: &str) -> Result<()>;
    async fn toggle_favorite(&self, id: &str) -> Result<bool>;

    async fn notifications(&self) -> Result<Vec<Notification>>;
    async fn mark_notification_read(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Demo,
}

/// The backend chosen for one session.
#[derive(Clone)]
pub struct Connection {
    pub mode: Mode,
    pub backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("mode", &self.mode).finish()
    }
}

impl Connection {
    pub fn live(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            mode: Mode::Live,
            backend: Arc::new(HttpBackend::new(&config.api_url)?),
        })
    }

    pub fn demo(backend: MemoryBackend) -> Self {
        Self::demo_shared(Arc::new(backend))
    }

    /// Demo mode over a backend the caller keeps a handle to, e.g. to
    /// snapshot it afterwards.
    pub fn demo_shared(backend: Arc<MemoryBackend>) -> Self {
        Self {
            mode: Mode::Demo,
            backend,
        }
    }

    /// The demo token or the demo login name ask for demo mode.
    pub fn wants_demo(stored_token: Option<&str>, login_email: Option<&str>) -> bool {
        stored_token == Some(fixtures::DEMO_TOKEN) || login_email == Some(fixtures::DEMO_EMAIL)
    }

    pub fn is_demo(&self) -> bool {
        self.mode == Mode::Demo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_token_asks_for_demo_mode() {
        assert!(Connection::wants_demo(Some(fixtures::DEMO_TOKEN), None));
    }

    #[test]
    fn demo_login_asks_for_demo_mode() {
        assert!(Connection::wants_demo(None, Some(fixtures::DEMO_EMAIL)));
        assert!(Connection::wants_demo(Some("abc"), Some(fixtures::DEMO_EMAIL)));
    }

    #[test]
    fn other_tokens_stay_live() {
        assert!(!Connection::wants_demo(Some("abc"), Some("a@b.c")));
        assert!(!Connection::wants_demo(None, None));

        let conn = Connection::live(&ClientConfig::default()).expect("live connection");
        assert_eq!(conn.mode, Mode::Live);
        assert!(!conn.is_demo());
    }
}
