use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{Session, UserBranding, UserId},
    error::{ApiError, DirectoryException},
    protocol::{BrandingLookupResponse, UserLookupResponse},
};
use tracing::debug;
use url::Url;

use crate::DirectoryService;

/// `GET {base}/users/{id}` and `GET {base}/users/{owner}/branding`.
pub struct HttpDirectory {
    http: Client,
    base_url: Url,
}

impl HttpDirectory {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build directory http client")?;
        Self::with_client(base_url, http)
    }

    fn with_client(base_url: &str, http: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid directory url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("directory url '{base_url}' cannot be used as a base"));
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("directory url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl DirectoryService for HttpDirectory {
    async fn fetch_user(&self, user_id: &UserId) -> Result<Session> {
        let url = self.endpoint(&["users", user_id.as_str()])?;
        debug!(%url, "directory: fetching user");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to reach directory for user {user_id}"))?;
        let body: UserLookupResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("invalid user record from directory")?;
        Ok(body.user)
    }

    async fn fetch_branding(&self, user: &Session) -> Result<Option<UserBranding>> {
        let owner = user.organization_owner();
        let url = self.endpoint(&["users", owner.as_str(), "branding"])?;
        debug!(%url, "directory: fetching branding");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to reach directory for branding of {owner}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: BrandingLookupResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("invalid branding record from directory")?;
        Ok(body.branding)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let exception = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => DirectoryException::from_api_error(status.as_u16(), api_error),
        Err(_) => DirectoryException::from_status(status.as_u16(), body),
    };
    Err(exception.into())
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
