use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::template::extract_variable_names;

pub const DAILY_CREDIT_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub ai_credits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditReceipt {
    pub success: bool,
    #[serde(default)]
    pub ai_credits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpaceKind {
    Private,
    Team,
    Public,
}

impl SpaceKind {
    pub fn label(self) -> &'static str {
        match self {
            SpaceKind::Private => "private",
            SpaceKind::Team => "team",
            SpaceKind::Public => "public",
        }
    }
}

impl std::str::FromStr for SpaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(SpaceKind::Private),
            "team" => Ok(SpaceKind::Team),
            "public" => Ok(SpaceKind::Public),
            other => Err(format!("unknown space kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SpaceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub prompt_count: u32,
    pub role: Role,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub space_id: String,
    #[serde(default)]
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub variables: Vec<String>,
}

fn first_version() -> u32 {
    1
}

impl Prompt {
    /// Re-derives `variables` from `content`.
    pub fn refresh_variables(&mut self) {
        self.variables = extract_variable_names(&self.content);
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            || self.content.to_lowercase().contains(&needle)
    }
}

/// Fields a caller supplies when creating a prompt. `variables` is derived on
/// the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    pub description: String,
    pub tags: Vec<String>,
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub variables: Vec<String>,
}

impl PromptDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        space_id: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            title: title.into(),
            variables: extract_variable_names(&content),
            content,
            description: "User created prompt".to_string(),
            tags: Vec::new(),
            space_id: space_id.into(),
            author_id: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn refresh_variables(&mut self) {
        self.variables = extract_variable_names(&self.content);
    }
}

/// Partial update sent to the backend. `variables` is only ever filled from
/// `content`, never set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
}

impl PromptPatch {
    /// Applies the patch to a local copy; used by the in-memory backend.
    pub fn apply_to(&self, prompt: &mut Prompt) {
        if let Some(title) = &self.title {
            prompt.title = title.clone();
        }
        if let Some(content) = &self.content {
            prompt.content = content.clone();
            prompt.refresh_variables();
        }
        if let Some(space_id) = &self.space_id {
            prompt.space_id = space_id.clone();
        }
        if let Some(tags) = &self.tags {
            prompt.tags = tags.clone();
        }
        if let Some(version) = self.version {
            prompt.version = version;
        }
    }
}

/// What an editor hands the store. Versioning is explicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub space_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub bump_version: bool,
}

impl PromptEdit {
    pub fn into_patch(self, current: &Prompt) -> PromptPatch {
        let content = self.content.unwrap_or_else(|| current.content.clone());
        PromptPatch {
            title: self.title,
            variables: Some(extract_variable_names(&content)),
            content: Some(content),
            space_id: self.space_id,
            tags: self.tags.map(normalize_tags),
            version: Some(if self.bump_version {
                current.version + 1
            } else {
                current.version
            }),
        }
    }
}

/// Trims tags and drops blanks and repeats, keeping first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        push_tag(&mut out, tag);
    }
    out
}

/// Adds a tag unless an identical one is already present.
pub fn push_tag(tags: &mut Vec<String>, tag: String) {
    let tag = tag.trim().to_string();
    if !tag.is_empty() && !tags.contains(&tag) {
        tags.push(tag);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Join,
    System,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub recipient: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteState {
    pub is_favorite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(content: &str) -> Prompt {
        let now = Utc::now();
        let mut p = Prompt {
            id: "p".to_string(),
            title: "Title".to_string(),
            content: content.to_string(),
            description: String::new(),
            tags: vec!["Email".to_string()],
            space_id: "s".to_string(),
            author_id: "u".to_string(),
            created_at: now,
            updated_at: now,
            is_favorite: false,
            version: 3,
            variables: Vec::new(),
        };
        p.refresh_variables();
        p
    }

    #[test]
    fn edit_recomputes_variables_even_without_content_change() {
        let mut current = prompt("Hi [NAME]");
        current.variables = vec!["STALE".to_string()];

        let patch = PromptEdit {
            title: Some("New".to_string()),
            ..PromptEdit::default()
        }
        .into_patch(&current);

        assert_eq!(patch.variables, Some(vec!["NAME".to_string()]));
        assert_eq!(patch.version, Some(3));
    }

    #[test]
    fn edit_bumps_version_only_on_request() {
        let current = prompt("x");
        let patch = PromptEdit {
            bump_version: true,
            ..PromptEdit::default()
        }
        .into_patch(&current);
        assert_eq!(patch.version, Some(4));
    }

    #[test]
    fn search_covers_title_tags_and_content() {
        let p = prompt("Translate [TEXT]");
        assert!(p.matches_query("title"));
        assert!(p.matches_query("email"));
        assert!(p.matches_query("TRANSLATE"));
        assert!(p.matches_query(""));
        assert!(!p.matches_query("missing"));
    }

    #[test]
    fn push_tag_deduplicates_and_trims() {
        let mut tags = vec!["a".to_string()];
        push_tag(&mut tags, " a ".to_string());
        push_tag(&mut tags, "b".to_string());
        push_tag(&mut tags, "  ".to_string());
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn space_kind_uses_uppercase_on_the_wire() {
        let json = serde_json::to_string(&SpaceKind::Team).unwrap();
        assert_eq!(json, "\"TEAM\"");
        assert_eq!("Public".parse::<SpaceKind>(), Ok(SpaceKind::Public));
    }
}
