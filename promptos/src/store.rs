//! Application state shared by every front end.
//!
//! `AppStore` owns one [`Connection`] and one [`Assistant`] for its whole
//! life. Nothing in here knows whether the backend is live or the demo.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::assist::{Assistant, Enhancement};
use crate::backend::{Backend, Connection};
use crate::credits::{ActionClass, CreditGate, InFlight};
use crate::error::{Error, Result};
use crate::model::{Notification, Prompt, PromptDraft, PromptEdit, Space, SpaceKind, User};

/// Which prompts the library is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    All,
    Favorites,
    Space(String),
}

impl View {
    pub fn space_id(&self) -> Option<&str> {
        match self {
            View::Space(id) => Some(id),
            _ => None,
        }
    }
}

pub struct AppStore {
    connection: Connection,
    assistant: Arc<dyn Assistant>,
    gate: CreditGate,
    token: Option<String>,
    user: Option<User>,
    spaces: Vec<Space>,
    prompts: Vec<Prompt>,
    notifications: Vec<Notification>,
    view: View,
    search_query: String,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("connection", &self.connection)
            .field("user", &self.user)
            .field("view", &self.view)
            .field("spaces", &self.spaces.len())
            .field("prompts", &self.prompts.len())
            .finish()
    }
}

impl AppStore {
    pub fn new(connection: Connection, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            connection,
            assistant,
            gate: CreditGate::new(),
            token: None,
            user: None,
            spaces: Vec::new(),
            prompts: Vec::new(),
            notifications: Vec::new(),
            view: View::All,
            search_query: String::new(),
        }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.connection.backend)
    }

    pub fn is_demo(&self) -> bool {
        self.connection.is_demo()
    }

    pub fn gate(&self) -> &CreditGate {
        &self.gate
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn space(&self, id: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.id == id)
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // ---- session ----

    /// Re-validates a stored token. Returns `false` and stays signed out when
    /// the backend rejects it.
    pub async fn restore(&mut self, token: &str) -> bool {
        let backend = self.backend();
        backend.set_token(Some(token.to_string()));
        match backend.current_user().await {
            Ok(user) => {
                debug!(user = %user.id, "session restored");
                self.token = Some(token.to_string());
                self.user = Some(user);
                self.load_session_data().await;
                true
            }
            Err(err) => {
                warn!(error = %err, "stored session rejected");
                self.logout();
                false
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let backend = self.backend();
        let session = backend.login(email, password).await?;
        self.begin_session(session.token, session.user.clone()).await;
        Ok(session.user)
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Result<User> {
        let backend = self.backend();
        let session = backend.register(name, email, password).await?;
        self.begin_session(session.token, session.user.clone()).await;
        Ok(session.user)
    }

    /// Forgets the token and every piece of session data.
    pub fn logout(&mut self) {
        self.connection.backend.set_token(None);
        self.token = None;
        self.user = None;
        self.spaces.clear();
        self.prompts.clear();
        self.notifications.clear();
        self.view = View::All;
        self.search_query.clear();
    }

    async fn begin_session(&mut self, token: String, user: User) {
        info!(user = %user.id, "signed in");
        self.connection.backend.set_token(Some(token.clone()));
        self.token = Some(token);
        self.user = Some(user);
        self.view = View::All;
        self.load_session_data().await;
    }

    async fn load_session_data(&mut self) {
        if let Err(err) = self.refresh_spaces().await {
            warn!(error = %err, "failed to fetch spaces");
        }
        if let Err(err) = self.reload_prompts().await {
            warn!(error = %err, "failed to fetch prompts");
        }
        if let Err(err) = self.refresh_notifications().await {
            warn!(error = %err, "failed to fetch notifications");
        }
    }

    fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(Error::NotSignedIn)
    }

    // ---- spaces ----

    pub async fn refresh_spaces(&mut self) -> Result<()> {
        self.require_user()?;
        self.spaces = self.backend().my_spaces().await?;
        Ok(())
    }

    /// Creates a space and makes it the active view.
    pub async fn create_space(&mut self, name: &str, kind: SpaceKind) -> Result<Space> {
        self.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Invalid("space name must not be empty".to_string()));
        }
        let space = self.backend().create_space(name, kind).await?;
        self.spaces.push(space.clone());
        self.view = View::Space(space.id.clone());
        self.prompts.clear();
        Ok(space)
    }

    pub async fn update_space(&mut self, id: &str, name: &str, description: &str) -> Result<Space> {
        self.require_user()?;
        let updated = self.backend().update_space(id, name, description).await?;
        match self.spaces.iter_mut().find(|s| s.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => self.spaces.push(updated.clone()),
        }
        Ok(updated)
    }

    /// Deletes a space and its prompts. An active view on it falls back to
    /// `All`.
    pub async fn delete_space(&mut self, id: &str) -> Result<()> {
        self.require_user()?;
        self.backend().delete_space(id).await?;
        self.spaces.retain(|s| s.id != id);
        self.prompts.retain(|p| p.space_id != id);
        if self.view.space_id() == Some(id) {
            self.view = View::All;
            if let Err(err) = self.reload_prompts().await {
                warn!(error = %err, "failed to reload prompts");
            }
        }
        Ok(())
    }

    /// Joins a team space by code. Failures are logged and reported as
    /// `false`.
    pub async fn join_space(&mut self, code: &str) -> bool {
        if self.require_user().is_err() {
            return false;
        }
        match self.backend().join_space(code.trim()).await {
            Ok(space) => {
                info!(space = %space.id, "joined space");
                if !self.spaces.iter().any(|s| s.id == space.id) {
                    self.spaces.push(space);
                }
                if let Err(err) = self.refresh_notifications().await {
                    warn!(error = %err, "failed to fetch notifications");
                }
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to join space");
                false
            }
        }
    }

    // ---- prompts ----

    /// Switches the active view and loads its prompts.
    pub async fn select_view(&mut self, view: View) -> Result<()> {
        self.view = view;
        self.reload_prompts().await
    }

    /// Space views load that space. All and Favorites load every space.
    pub async fn reload_prompts(&mut self) -> Result<()> {
        self.require_user()?;
        let backend = self.backend();
        let loaded = match &self.view {
            View::Space(id) => backend.prompts_in_space(id).await?,
            View::All | View::Favorites => {
                let mut all: Vec<Prompt> = Vec::new();
                for space in &self.spaces {
                    for prompt in backend.prompts_in_space(&space.id).await? {
                        if !all.iter().any(|p| p.id == prompt.id) {
                            all.push(prompt);
                        }
                    }
                }
                all
            }
        };
        debug!(count = loaded.len(), view = ?self.view, "prompts loaded");
        self.prompts = loaded;
        Ok(())
    }

    pub async fn add_prompt(&mut self, mut draft: PromptDraft) -> Result<Prompt> {
        let user = self.require_user()?;
        if draft.author_id.is_none() {
            draft.author_id = Some(user.id.clone());
        }
        draft.refresh_variables();
        let prompt = self.backend().create_prompt(&draft).await?;
        self.prompts.insert(0, prompt.clone());
        if let Some(space) = self.spaces.iter_mut().find(|s| s.id == prompt.space_id) {
            space.prompt_count += 1;
        }
        Ok(prompt)
    }

    /// Saves an edit. The version only moves when `edit.bump_version` is set.
    pub async fn update_prompt(&mut self, id: &str, edit: PromptEdit) -> Result<Prompt> {
        self.require_user()?;
        let current = self
            .prompt(id)
            .cloned()
            .ok_or_else(|| Error::not_found("prompt", id))?;
        let patch = edit.into_patch(&current);
        let updated = self.backend().update_prompt(id, &patch).await?;
        if let Some(slot) = self.prompts.iter_mut().find(|p| p.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete_prompt(&mut self, id: &str) -> Result<()> {
        self.require_user()?;
        self.backend().delete_prompt(id).await?;
        if let Some(pos) = self.prompts.iter().position(|p| p.id == id) {
            let removed = self.prompts.remove(pos);
            if let Some(space) = self.spaces.iter_mut().find(|s| s.id == removed.space_id) {
                space.prompt_count = space.prompt_count.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Flips the favorite flag locally, then confirms it with the backend and
    /// returns the confirmed flag. On failure the flag is reverted and the
    /// error returned.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let before = self
            .prompt(id)
            .map(|p| p.is_favorite)
            .ok_or_else(|| Error::not_found("prompt", id))?;
        self.set_favorite(id, !before);
        match self.backend().toggle_favorite(id).await {
            Ok(after) => {
                self.set_favorite(id, after);
                Ok(after)
            }
            Err(err) => {
                warn!(prompt = id, error = %err, "failed to toggle favorite");
                self.set_favorite(id, before);
                Err(err)
            }
        }
    }

    fn set_favorite(&mut self, id: &str, state: bool) {
        if let Some(prompt) = self.prompts.iter_mut().find(|p| p.id == id) {
            prompt.is_favorite = state;
        }
    }

    /// Search hits in the active view, newest first.
    pub fn filtered_prompts(&self) -> Vec<&Prompt> {
        let mut hits: Vec<&Prompt> = self
            .prompts
            .iter()
            .filter(|p| match &self.view {
                View::All => true,
                View::Favorites => p.is_favorite,
                View::Space(id) => &p.space_id == id,
            })
            .filter(|p| p.matches_query(&self.search_query))
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits
    }

    // ---- notifications ----

    pub async fn refresh_notifications(&mut self) -> Result<()> {
        self.require_user()?;
        let list = self.backend().notifications().await?;
        self.apply_notifications(list);
        Ok(())
    }

    /// Replaces the cached list, e.g. with a poller update.
    pub fn apply_notifications(&mut self, list: Vec<Notification>) {
        self.notifications = list;
    }

    pub async fn mark_notification_read(&mut self, id: &str) -> Result<()> {
        self.require_user()?;
        self.backend().mark_notification_read(id).await?;
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
        Ok(())
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    // ---- credits and AI ----

    /// Spends one credit for `class`. The returned guard keeps the class
    /// marked busy until it is dropped.
    pub async fn use_ai_credit(&mut self, class: ActionClass) -> Result<InFlight> {
        self.require_user()?;
        let backend = self.backend();
        let guard = self.gate.authorize(backend.as_ref(), class).await?;
        if let Some(user) = self.user.as_mut() {
            user.ai_credits = guard.remaining_credits();
        }
        Ok(guard)
    }

    /// Credits earned outside the AI actions, e.g. from the arcade.
    pub async fn add_ai_credits(&mut self, amount: u32) -> Result<u32> {
        self.require_user()?;
        if amount == 0 {
            return Err(Error::Invalid("amount must be positive".to_string()));
        }
        let receipt = self.backend().reward_credits(amount).await?;
        if !receipt.success {
            return Err(Error::Api {
                status: 400,
                message: "Reward rejected".to_string(),
            });
        }
        if let Some(user) = self.user.as_mut() {
            user.ai_credits = receipt.ai_credits;
        }
        info!(amount, balance = receipt.ai_credits, "credits rewarded");
        Ok(receipt.ai_credits)
    }

    pub async fn enhance_prompt(&mut self, text: &str) -> Result<Enhancement> {
        let _in_flight = self.use_ai_credit(ActionClass::Enhance).await?;
        Ok(self.assistant.enhance(text).await)
    }

    pub async fn prompt_variations(&mut self, text: &str) -> Result<Vec<String>> {
        let _in_flight = self.use_ai_credit(ActionClass::Variations).await?;
        Ok(self.assistant.variations(text).await)
    }

    pub async fn run_prompt(&mut self, text: &str) -> Result<String> {
        let _in_flight = self.use_ai_credit(ActionClass::Run).await?;
        Ok(self.assistant.run(text).await)
    }
}
