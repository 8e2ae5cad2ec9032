pub mod assist;
pub mod backend;
pub mod config;
pub mod credits;
pub mod error;
pub mod model;
pub mod notify;
pub mod store;
pub mod template;

pub use assist::{Assistant, Enhancement, GeminiAssistant, OfflineAssistant, assistant_from_config};
pub use backend::{Backend, Connection, HttpBackend, MemoryBackend, MemorySnapshot, Mode};
pub use config::{AiConfig, ClientConfig};
pub use credits::{ActionClass, CreditGate, InFlight};
pub use error::{Error, Result};
pub use model::{
    AuthSession, CreditReceipt, DAILY_CREDIT_LIMIT, Notification, NotificationKind, Prompt,
    PromptDraft, PromptEdit, PromptPatch, Role, Space, SpaceKind, User,
};
pub use notify::Poller;
pub use store::{AppStore, View};
pub use template::{CopyMode, Template, TemplateSegment, VariableBindings};
