//! The HTTP client capability every fetch path is built on.
//!
//! [`HttpClient::get`] performs a GET with a fixed timeout and transparently
//! retries the statuses in [`RETRY_STATUSES`]. Everything else, blocked
//! statuses included, comes back as a [`RawResponse`] for the caller to
//! classify.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use shelfscan_core::RetryPolicy;

use crate::error::ScraperError;
use crate::rate_limit::{retry_with_backoff, RETRY_STATUSES};

/// Statuses that signal automated-traffic detection.
pub const BLOCKED_STATUSES: [u16; 2] = [403, 412];

/// Status and body of a completed GET.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        BLOCKED_STATUSES.contains(&self.status)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns the response into its body, or the typed error its status
    /// represents.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Blocked`] for 403/412.
    /// - [`ScraperError::UnexpectedStatus`] for any other non-2xx status.
    pub fn into_body(self) -> Result<String, ScraperError> {
        if self.is_blocked() {
            return Err(ScraperError::Blocked {
                url: self.url,
                status: self.status,
            });
        }
        if !self.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: self.status,
                url: self.url,
            });
        }
        Ok(self.body)
    }

    /// Classifies the status, then deserializes the body.
    ///
    /// # Errors
    ///
    /// - Status errors as in [`Self::into_body`].
    /// - [`ScraperError::Malformed`] when a 2xx body is not a JSON document
    ///   (an HTML interstitial, an empty body).
    /// - [`ScraperError::Deserialize`] when the JSON does not match `T`.
    pub fn json<T: DeserializeOwned>(self, context: &str) -> Result<T, ScraperError> {
        let body = self.into_body()?;
        if !body.trim_start().starts_with(['{', '[']) {
            return Err(ScraperError::Malformed {
                context: context.to_owned(),
                reason: "body is not JSON".to_owned(),
            });
        }
        serde_json::from_str::<T>(&body).map_err(|source| ScraperError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }
}

/// GET-only HTTP client with a per-request timeout and transparent retry.
pub struct HttpClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds: the n-th retry waits `backoff_base_secs * 2^(n-1)`.
    backoff_base_secs: u64,
}

impl HttpClient {
    /// Creates an `HttpClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates an `HttpClient` whose transparent retry follows `policy`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_policy(
        timeout_secs: u64,
        user_agent: &str,
        policy: &RetryPolicy,
    ) -> Result<Self, ScraperError> {
        Self::new(
            timeout_secs,
            user_agent,
            policy.transport_max_retries,
            policy.transport_backoff_base_secs,
        )
    }

    /// Issues a GET for `url` with `query` parameters and extra `headers`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RetriesExhausted`]: a retry status persisted past `max_retries`.
    /// - [`ScraperError::Http`]: network or TLS failure after all retries exhausted.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<RawResponse, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let mut request = self.client.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();

            if RETRY_STATUSES.contains(&status) {
                return Err(ScraperError::RetriesExhausted {
                    url: url.to_owned(),
                    status,
                });
            }

            let final_url = response.url().to_string();
            let body = response.text().await?;
            Ok(RawResponse {
                url: final_url,
                status,
                body,
            })
        })
        .await
    }
}

/// Joins `path` onto `base`, tolerating a trailing slash on either side.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if the result does not parse.
pub fn join_url(base: &str, path: &str) -> Result<String, ScraperError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    reqwest::Url::parse(&joined)
        .map(|u| u.to_string())
        .map_err(|e| ScraperError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
