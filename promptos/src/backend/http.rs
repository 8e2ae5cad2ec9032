use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::model::{
    AuthSession, CreditReceipt, FavoriteState, Notification, Prompt, PromptDraft, PromptPatch,
    Space, SpaceKind, User,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-over-HTTP client for the prompt service. One request per call, no
/// retries.
#[derive(Debug)]
pub struct HttpBackend {
    base: Url,
    client: Client,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::from)?;
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| Error::Invalid(format!("bad api url {base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Invalid(format!("bad api url {base_url}")));
        }
        Ok(Self {
            base,
            client,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn token(&self) -> Option<String> {
        self.token.read().map(|t| t.clone()).unwrap_or(None)
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded;
    /// empty and dot segments are refused since URL normalisation would
    /// drop them and hit a different route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Invalid(format!("{} cannot take a path", self.base)))?;
            path.pop_if_empty();
            for segment in segments {
                if matches!(*segment, "" | "." | "..") {
                    return Err(Error::Invalid(format!("bad path segment {segment:?}")));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "backend request");
        let builder = self.client.request(method, url);
        Ok(match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::PUT, path)?.json(body)).await
    }

    async fn put_empty<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        self.send(self.request(Method::PUT, path)?).await
    }

    // Acknowledgement bodies vary between endpoints; only the status matters.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    })
}

/// Pulls `message` (or `error`) out of a JSON error body, else the raw text.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => ["message", "error", "msg"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.post(&["auth", "login"], &json!({ "email": email, "password": password }))
            .await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        self.post(
            &["auth", "register"],
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    async fn current_user(&self) -> Result<User> {
        if self.token().is_none() {
            return Err(Error::NotSignedIn);
        }
        self.get(&["auth", "me"]).await
    }

    async fn deduct_credit(&self) -> Result<CreditReceipt> {
        self.send(self.request(Method::POST, &["auth", "deduct-credit"])?)
            .await
    }

    async fn reward_credits(&self, amount: u32) -> Result<CreditReceipt> {
        self.post(&["auth", "reward-credit"], &json!({ "amount": amount }))
            .await
    }

    async fn create_space(&self, name: &str, kind: SpaceKind) -> Result<Space> {
        self.post(&["groups", "create"], &json!({ "name": name, "type": kind }))
            .await
    }

    async fn update_space(&self, id: &str, name: &str, description: &str) -> Result<Space> {
        self.put(
            &["groups", id],
            &json!({ "name": name, "description": description }),
        )
        .await
    }

    async fn delete_space(&self, id: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &["groups", id])?)
            .await
    }

    async fn my_spaces(&self) -> Result<Vec<Space>> {
        self.get(&["groups", "my-groups"]).await
    }

    async fn join_space(&self, code: &str) -> Result<Space> {
        self.post(&["groups", "join"], &json!({ "groupCode": code })).await
    }

    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt> {
        self.post(&["prompts", "create"], draft).await
    }

    async fn prompts_in_space(&self, space_id: &str) -> Result<Vec<Prompt>> {
        self.get(&["prompts", space_id]).await
    }

    async fn update_prompt(&self, id: &str, patch: &PromptPatch) -> Result<Prompt> {
        self.put(&["prompts", id], patch).await
    }

    async fn delete_prompt(&self, id: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &["prompts", id])?)
            .await
    }

    async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let state: FavoriteState = self
            .put_empty(&["prompts", id, "favorite"])
            .await?;
        Ok(state.is_favorite)
    }

    async fn notifications(&self) -> Result<Vec<Notification>> {
        self.get(&["notifications"]).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.send_unit(self.request(Method::PUT, &["notifications", id, "read"])?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(error_message("plain").as_deref(), Some("plain"));
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn path_segments_are_escaped() {
        let backend = HttpBackend::new("http://localhost:5000/api").expect("client");
        let url = backend.endpoint(&["prompts", "a/b c?#%", "favorite"]).expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/prompts/a%2Fb%20c%3F%23%25/favorite"
        );
    }

    #[test]
    fn dot_segments_are_refused() {
        let backend = HttpBackend::new("http://localhost:5000/api").expect("client");
        for id in ["", ".", ".."] {
            let err = backend.endpoint(&["prompts", id]).expect_err("dot segment");
            assert!(matches!(err, Error::Invalid(_)), "{id:?}");
        }
        assert!(backend.endpoint(&["prompts", "..x"]).is_ok());
    }

    #[test]
    fn unusable_base_urls_are_rejected() {
        assert!(matches!(HttpBackend::new("not a url"), Err(Error::Invalid(_))));
        assert!(matches!(HttpBackend::new("mailto:x@y.z"), Err(Error::Invalid(_))));
    }

    #[test]
    fn base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:5000/api/").expect("client");
        assert_eq!(backend.base_url(), "http://localhost:5000/api");
    }
}
