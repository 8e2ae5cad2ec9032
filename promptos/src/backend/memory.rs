use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::Backend;
use crate::backend::fixtures::{self, DEMO_EMAIL, DEMO_PASSWORD, DEMO_TOKEN};
use crate::error::{Error, Result};
use crate::model::{
    AuthSession, CreditReceipt, DAILY_CREDIT_LIMIT, Notification, NotificationKind, Prompt,
    PromptDraft, PromptPatch, Role, Space, SpaceKind, User,
};

pub const MIN_JOIN_CODE_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user: User,
    pub password: String,
    pub token: String,
    /// `None` disables the daily cap.
    #[serde(default)]
    pub daily_cap: Option<u32>,
    #[serde(default)]
    pub used_today: u32,
    #[serde(default)]
    pub usage_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub space_id: String,
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: String,
    pub prompt_id: String,
}

/// Everything the in-memory service knows; serializable so demo sessions can
/// be carried across process restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub accounts: Vec<Account>,
    pub spaces: Vec<Space>,
    pub memberships: Vec<Membership>,
    pub prompts: Vec<Prompt>,
    pub favorites: Vec<Favorite>,
    pub notifications: Vec<Notification>,
}

impl MemorySnapshot {
    pub fn demo() -> Self {
        let root = fixtures::demo_user();
        let spaces = fixtures::demo_spaces();
        let prompts = fixtures::demo_prompts(Utc::now());

        let memberships = spaces
            .iter()
            .map(|space| Membership {
                space_id: space.id.clone(),
                user_id: root.id.clone(),
                role: space.role,
            })
            .collect();

        let favorites = prompts
            .iter()
            .filter(|p| p.is_favorite)
            .map(|p| Favorite {
                user_id: root.id.clone(),
                prompt_id: p.id.clone(),
            })
            .collect();

        Self {
            accounts: vec![Account {
                user: root,
                password: DEMO_PASSWORD.to_string(),
                token: DEMO_TOKEN.to_string(),
                daily_cap: None,
                used_today: 0,
                usage_day: None,
            }],
            spaces,
            memberships,
            prompts,
            favorites,
            notifications: Vec::new(),
        }
    }
}

/// In-process stand-in for the prompt service.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemorySnapshot>,
    token: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new(snapshot: MemorySnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            token: Mutex::new(None),
        }
    }

    /// Seeded demo data with the demo account signed in.
    pub fn demo() -> Self {
        let backend = Self::new(MemorySnapshot::demo());
        backend.set_token(Some(DEMO_TOKEN.to_string()));
        backend
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, MemorySnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn with_account<T>(
        &self,
        f: impl FnOnce(&mut MemorySnapshot, usize) -> Result<T>,
    ) -> Result<T> {
        let token = self.current_token().ok_or(Error::NotSignedIn)?;
        let mut state = self.lock_state();
        let idx = state
            .accounts
            .iter()
            .position(|a| a.token == token)
            .ok_or_else(|| unauthorized("Not authenticated"))?;
        f(&mut *state, idx)
    }
}

fn unauthorized(message: &str) -> Error {
    Error::Api {
        status: 401,
        message: message.to_string(),
    }
}

fn forbidden(message: &str) -> Error {
    Error::Api {
        status: 403,
        message: message.to_string(),
    }
}

fn bad_request(message: &str) -> Error {
    Error::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}

fn join_code() -> String {
    Uuid::new_v4().simple().to_string()[..7].to_uppercase()
}

impl MemorySnapshot {
    fn role_in(&self, space_id: &str, user_id: &str) -> Option<Role> {
        self.memberships
            .iter()
            .find(|m| m.space_id == space_id && m.user_id == user_id)
            .map(|m| m.role)
    }

    fn space_for(&self, space_id: &str, user_id: &str) -> Result<Space> {
        let role = self
            .role_in(space_id, user_id)
            .ok_or_else(|| forbidden("Not a member of this group"))?;
        let mut space = self
            .spaces
            .iter()
            .find(|s| s.id == space_id)
            .cloned()
            .ok_or_else(|| Error::not_found("space", space_id))?;
        space.role = role;
        Ok(space)
    }

    fn is_favorite(&self, user_id: &str, prompt_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|f| f.user_id == user_id && f.prompt_id == prompt_id)
    }

    fn prompt_view(&self, prompt: &Prompt, user_id: &str) -> Prompt {
        let mut view = prompt.clone();
        view.is_favorite = self.is_favorite(user_id, &prompt.id);
        view
    }

    fn prompt_index_for(&self, prompt_id: &str, user_id: &str) -> Result<usize> {
        let idx = self
            .prompts
            .iter()
            .position(|p| p.id == prompt_id)
            .ok_or_else(|| Error::not_found("prompt", prompt_id))?;
        if self.role_in(&self.prompts[idx].space_id, user_id).is_none() {
            return Err(forbidden("Not a member of this group"));
        }
        Ok(idx)
    }

    fn bump_prompt_count(&mut self, space_id: &str, delta: i64) {
        if let Some(space) = self.spaces.iter_mut().find(|s| s.id == space_id) {
            space.prompt_count = (i64::from(space.prompt_count) + delta).max(0) as u32;
        }
    }

    fn notify(&mut self, recipient: &str, kind: NotificationKind, message: String) {
        self.notifications.push(Notification {
            id: short_id(),
            recipient: recipient.to_string(),
            message,
            kind,
            read: false,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn set_token(&self, token: Option<String>) {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let state = self.lock_state();
        let account = state
            .accounts
            .iter()
            .find(|a| {
                (a.user.email.eq_ignore_ascii_case(email)
                    || (email == DEMO_EMAIL && a.token == DEMO_TOKEN))
                    && a.password == password
            })
            .ok_or_else(|| bad_request("Invalid credentials"))?;
        Ok(AuthSession {
            token: account.token.clone(),
            user: account.user.clone(),
        })
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(bad_request("Please provide name, email and password"));
        }
        let mut state = self.lock_state();
        if state
            .accounts
            .iter()
            .any(|a| a.user.email.eq_ignore_ascii_case(email))
        {
            return Err(bad_request("User already exists"));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            avatar: None,
            ai_credits: DAILY_CREDIT_LIMIT,
        };
        let token = Uuid::new_v4().to_string();
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
            token: token.clone(),
            daily_cap: Some(DAILY_CREDIT_LIMIT),
            used_today: 0,
            usage_day: None,
        });
        Ok(AuthSession { token, user })
    }

    async fn current_user(&self) -> Result<User> {
        self.with_account(|state, idx| Ok(state.accounts[idx].user.clone()))
    }

    async fn deduct_credit(&self) -> Result<CreditReceipt> {
        self.with_account(|state, idx| {
            let account = &mut state.accounts[idx];
            let today = Utc::now().date_naive();
            if account.usage_day != Some(today) {
                account.usage_day = Some(today);
                account.used_today = 0;
            }
            let capped = account
                .daily_cap
                .is_some_and(|cap| account.used_today >= cap);
            if capped || account.user.ai_credits == 0 {
                return Ok(CreditReceipt {
                    success: false,
                    ai_credits: account.user.ai_credits,
                });
            }
            account.user.ai_credits -= 1;
            account.used_today += 1;
            Ok(CreditReceipt {
                success: true,
                ai_credits: account.user.ai_credits,
            })
        })
    }

    async fn reward_credits(&self, amount: u32) -> Result<CreditReceipt> {
        self.with_account(|state, idx| {
            let user = &mut state.accounts[idx].user;
            user.ai_credits = user.ai_credits.saturating_add(amount);
            Ok(CreditReceipt {
                success: true,
                ai_credits: user.ai_credits,
            })
        })
    }

    async fn create_space(&self, name: &str, kind: SpaceKind) -> Result<Space> {
        if name.trim().is_empty() {
            return Err(bad_request("Group name is required"));
        }
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let space = Space {
                id: short_id(),
                name: name.trim().to_string(),
                kind,
                description: None,
                join_code: (kind == SpaceKind::Team).then(join_code),
                member_count: 1,
                prompt_count: 0,
                role: Role::Owner,
                icon: "Zap".to_string(),
                color: "text-neon-pink".to_string(),
                created_by: Some(user_id.clone()),
            };
            state.spaces.push(space.clone());
            state.memberships.push(Membership {
                space_id: space.id.clone(),
                user_id,
                role: Role::Owner,
            });
            Ok(space)
        })
    }

    async fn update_space(&self, id: &str, name: &str, description: &str) -> Result<Space> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            match state.role_in(id, &user_id) {
                Some(Role::Owner) | Some(Role::Admin) => {}
                Some(Role::Member) => return Err(forbidden("Only owners can edit this group")),
                None => return Err(Error::not_found("space", id)),
            }
            let space = state
                .spaces
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| Error::not_found("space", id))?;
            space.name = name.to_string();
            space.description = Some(description.to_string());
            state.space_for(id, &user_id)
        })
    }

    async fn delete_space(&self, id: &str) -> Result<()> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            match state.role_in(id, &user_id) {
                Some(Role::Owner) => {}
                Some(_) => return Err(forbidden("Only the owner can delete this group")),
                None => return Err(Error::not_found("space", id)),
            }
            let removed: Vec<String> = state
                .prompts
                .iter()
                .filter(|p| p.space_id == id)
                .map(|p| p.id.clone())
                .collect();
            state.prompts.retain(|p| p.space_id != id);
            state.favorites.retain(|f| !removed.contains(&f.prompt_id));
            state.memberships.retain(|m| m.space_id != id);
            state.spaces.retain(|s| s.id != id);
            Ok(())
        })
    }

    async fn my_spaces(&self) -> Result<Vec<Space>> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let ids: Vec<String> = state
                .memberships
                .iter()
                .filter(|m| m.user_id == user_id)
                .map(|m| m.space_id.clone())
                .collect();
            ids.iter().map(|id| state.space_for(id, &user_id)).collect()
        })
    }

    async fn join_space(&self, code: &str) -> Result<Space> {
        let code = code.trim();
        if code.chars().count() < MIN_JOIN_CODE_LEN {
            return Err(bad_request("Invalid group code"));
        }
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let space_id = state
                .spaces
                .iter()
                .find(|s| s.join_code.as_deref() == Some(code))
                .map(|s| s.id.clone())
                .ok_or_else(|| Error::not_found("space", code))?;

            if state.role_in(&space_id, &user_id).is_none() {
                state.memberships.push(Membership {
                    space_id: space_id.clone(),
                    user_id: user_id.clone(),
                    role: Role::Member,
                });
                if let Some(space) = state.spaces.iter_mut().find(|s| s.id == space_id) {
                    space.member_count += 1;
                }
                let name = state
                    .spaces
                    .iter()
                    .find(|s| s.id == space_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                state.notify(
                    &user_id,
                    NotificationKind::Join,
                    format!("You joined {name}"),
                );
            }
            state.space_for(&space_id, &user_id)
        })
    }

    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt> {
        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(bad_request("Title and content are required"));
        }
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            if state.role_in(&draft.space_id, &user_id).is_none() {
                return Err(forbidden("Not a member of this group"));
            }
            let now = Utc::now();
            let mut prompt = Prompt {
                id: short_id(),
                title: draft.title.clone(),
                content: draft.content.clone(),
                description: draft.description.clone(),
                tags: draft.tags.clone(),
                space_id: draft.space_id.clone(),
                author_id: user_id.clone(),
                created_at: now,
                updated_at: now,
                is_favorite: false,
                version: 1,
                variables: Vec::new(),
            };
            prompt.refresh_variables();
            state.prompts.push(prompt.clone());
            state.bump_prompt_count(&draft.space_id, 1);
            Ok(prompt)
        })
    }

    async fn prompts_in_space(&self, space_id: &str) -> Result<Vec<Prompt>> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            if state.role_in(space_id, &user_id).is_none() {
                return Err(forbidden("Not a member of this group"));
            }
            Ok(state
                .prompts
                .iter()
                .filter(|p| p.space_id == space_id)
                .map(|p| state.prompt_view(p, &user_id))
                .collect())
        })
    }

    async fn update_prompt(&self, id: &str, patch: &PromptPatch) -> Result<Prompt> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let pidx = state.prompt_index_for(id, &user_id)?;
            if let Some(target) = &patch.space_id {
                if state.role_in(target, &user_id).is_none() {
                    return Err(forbidden("Not a member of the target group"));
                }
            }
            let old_space = state.prompts[pidx].space_id.clone();
            patch.apply_to(&mut state.prompts[pidx]);
            state.prompts[pidx].updated_at = Utc::now();
            let new_space = state.prompts[pidx].space_id.clone();
            if new_space != old_space {
                state.bump_prompt_count(&old_space, -1);
                state.bump_prompt_count(&new_space, 1);
            }
            Ok(state.prompt_view(&state.prompts[pidx], &user_id))
        })
    }

    async fn delete_prompt(&self, id: &str) -> Result<()> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let pidx = state.prompt_index_for(id, &user_id)?;
            let removed = state.prompts.remove(pidx);
            state.favorites.retain(|f| f.prompt_id != removed.id);
            state.bump_prompt_count(&removed.space_id, -1);
            Ok(())
        })
    }

    async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            state.prompt_index_for(id, &user_id)?;
            if state.is_favorite(&user_id, id) {
                state
                    .favorites
                    .retain(|f| !(f.user_id == user_id && f.prompt_id == id));
                Ok(false)
            } else {
                state.favorites.push(Favorite {
                    user_id,
                    prompt_id: id.to_string(),
                });
                Ok(true)
            }
        })
    }

    async fn notifications(&self) -> Result<Vec<Notification>> {
        self.with_account(|state, idx| {
            let user_id = &state.accounts[idx].user.id;
            let mut mine: Vec<Notification> = state
                .notifications
                .iter()
                .filter(|n| &n.recipient == user_id)
                .cloned()
                .collect();
            mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(mine)
        })
    }

    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.with_account(|state, idx| {
            let user_id = state.accounts[idx].user.id.clone();
            let note = state
                .notifications
                .iter_mut()
                .find(|n| n.id == id && n.recipient == user_id)
                .ok_or_else(|| Error::not_found("notification", id))?;
            note.read = true;
            Ok(())
        })
    }
}
