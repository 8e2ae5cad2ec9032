use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_AI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub ai: AiConfig,
    pub poll_interval: Duration,
    pub state_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::resolve(|_| None)
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::resolve(|k| std::env::var(k).ok())
    }

    /// Resolves every setting through `get_env` so tests can inject values.
    pub fn resolve<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_url = non_empty(get_env("PROMPTOS_API_URL"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key =
            non_empty(get_env("GEMINI_API_KEY")).or_else(|| non_empty(get_env("API_KEY")));

        let ai = AiConfig {
            api_key,
            base_url: non_empty(get_env("PROMPTOS_AI_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AI_URL.to_string()),
            model: non_empty(get_env("PROMPTOS_AI_MODEL"))
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
        };

        let poll_interval = get_env("PROMPTOS_POLL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let state_dir = resolve_state_dir(&mut get_env);

        Self {
            api_url,
            ai,
            poll_interval,
            state_dir,
        }
    }
}

fn resolve_state_dir<F>(get_env: &mut F) -> PathBuf
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(explicit) = non_empty(get_env("PROMPTOS_STATE_DIR")) {
        return PathBuf::from(explicit);
    }

    let base = non_empty(get_env("XDG_STATE_HOME"))
        .map(PathBuf::from)
        .or_else(|| {
            non_empty(get_env("HOME")).map(|home| {
                let mut p = PathBuf::from(home);
                p.push(".local");
                p.push("state");
                p
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("promptos")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
