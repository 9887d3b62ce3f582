//! Reddit OAuth sessions (application-only, client-credentials grant).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::raw::{RawThread, parse_search_page, parse_thread};
use super::{Session, SessionFactory};
use crate::config::{ApiConfig, Config, CredentialsConfig, SearchConfig};
use crate::error::{Error, FetchError, Result};
use crate::types::{IdentifierBatch, PostId};

/// Largest page the search endpoint serves
const SEARCH_PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Creates one [`RedditSession`] per call, each with its own HTTP client and token
pub struct RedditSessionFactory {
    credentials: CredentialsConfig,
    api: ApiConfig,
}

impl RedditSessionFactory {
    /// Factory for the credentials and endpoints in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            credentials: config.credentials.clone(),
            api: config.api.clone(),
        }
    }

    async fn fetch_token(&self, http: &reqwest::Client) -> Result<String> {
        let url = endpoint(&self.api.auth_base_url, &["api", "v1", "access_token"])
            .map_err(|e| Error::config("api.auth_base_url", e.to_string()))?;

        let response = http
            .post(url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Session(format!("token request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::config(
                "credentials",
                format!("client credentials rejected (HTTP {})", status.as_u16()),
            ));
        }
        if !status.is_success() {
            return Err(Error::Session(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Session(format!("unreadable token response: {e}")))?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(access_token),
            _ => Err(Error::config(
                "credentials",
                format!(
                    "no access token issued: {}",
                    token.error.as_deref().unwrap_or("unknown error")
                ),
            )),
        }
    }
}

#[async_trait]
impl SessionFactory for RedditSessionFactory {
    async fn create(&self) -> Result<Box<dyn Session>> {
        let http = reqwest::Client::builder()
            .timeout(self.api.request_timeout)
            .user_agent(self.credentials.user_agent())
            .build()
            .map_err(|e| Error::Session(format!("failed to create HTTP client: {e}")))?;

        let token = self.fetch_token(&http).await?;
        debug!("Obtained application access token");

        Ok(Box::new(RedditSession {
            http,
            token,
            credentials: self.credentials.clone(),
            api: self.api.clone(),
        }))
    }
}

/// One authenticated connection; owned by a single worker
pub struct RedditSession {
    http: reqwest::Client,
    token: String,
    credentials: CredentialsConfig,
    api: ApiConfig,
}

impl RedditSession {
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.api.api_base_url, segments)
            .map_err(|e| Error::config("api.api_base_url", e.to_string()))
    }

    fn classify_send_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.api.request_timeout)
        } else {
            FetchError::Network(e)
        }
    }
}

#[async_trait]
impl Session for RedditSession {
    async fn search(&self, search: &SearchConfig) -> Result<IdentifierBatch> {
        let url = self.api_url(&["r", &search.subreddit, "search"])?;
        let mut entries = Vec::with_capacity(search.limit.min(SEARCH_PAGE_SIZE));
        let mut after: Option<String> = None;

        while entries.len() < search.limit {
            let page_size = (search.limit - entries.len()).min(SEARCH_PAGE_SIZE);
            let page_size = page_size.to_string();
            let mut query = vec![
                ("q", search.query.as_str()),
                ("restrict_sr", "on"),
                ("sort", search.sort.as_str()),
                ("limit", page_size.as_str()),
                ("raw_json", "1"),
            ];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Api {
                    status: status.as_u16(),
                    message: format!("search r/{} for {:?}", search.subreddit, search.query),
                });
            }

            let body = response.bytes().await?;
            let (page, next) = parse_search_page(&body)?;
            debug!(
                subreddit = %search.subreddit,
                page_entries = page.len(),
                "Fetched search page"
            );

            let exhausted = page.is_empty() || next.is_none();
            entries.extend(page);
            if exhausted {
                break;
            }
            after = next;
        }

        entries.truncate(search.limit);
        info!(
            subreddit = %search.subreddit,
            query = %search.query,
            found = entries.len(),
            "Search complete"
        );
        Ok(IdentifierBatch::new(entries))
    }

    async fn load_thread(&self, id: &PostId) -> std::result::Result<RawThread, FetchError> {
        let url = self
            .api_url(&["comments", id.as_str()])
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("raw_json", "1")])
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        parse_thread(&body)
    }

    async fn close(&self) {
        let url = match endpoint(&self.api.auth_base_url, &["api", "v1", "revoke_token"]) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "Skipping token revocation");
                return;
            }
        };

        let result = self
            .http
            .post(url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("token", self.token.as_str()),
                ("token_type_hint", "access_token"),
            ])
            .timeout(Duration::from_secs(5).min(self.api.request_timeout))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => debug!("Revoked access token"),
            Ok(response) => debug!(
                status = response.status().as_u16(),
                "Token revocation refused"
            ),
            Err(e) => debug!(error = %e, "Token revocation failed"),
        }
    }
}

/// Append percent-encoded path segments to a base URL.
fn endpoint(base: &str, segments: &[&str]) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
