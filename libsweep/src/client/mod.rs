//! HTTP client for OCI registry communication.
//!
//! This module provides a thin HTTP client built on reqwest. It speaks the
//! two calls the cleaner needs: the tags listing (including the `manifest`
//! and `child` extension fields that Google-style registries return) and
//! manifest deletion. Token challenges (`WWW-Authenticate: Bearer ...`) are
//! answered transparently.

use crate::auth::{AuthChallenge, Credentials};
use crate::digest::Digest;
use crate::error::{Result, SweepError};
use crate::manifest::{Listing, ManifestInfo};
use crate::reference::{Reference, Repository};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, LINK, RETRY_AFTER, WWW_AUTHENTICATE};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod tests;

/// Response from the tags list endpoint, including registry extensions.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    /// Repository name
    #[serde(default)]
    name: String,
    /// Manifests keyed by digest (extension)
    #[serde(default)]
    manifest: BTreeMap<String, ManifestEntry>,
    /// Child repository names (extension)
    #[serde(default)]
    child: Vec<String>,
}

/// Per-manifest metadata from the tags list extension.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    #[serde(default)]
    tag: Vec<String>,
    #[serde(default, deserialize_with = "number")]
    time_created_ms: i64,
    #[serde(default, deserialize_with = "number")]
    time_uploaded_ms: i64,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    image_size_bytes: Option<i64>,
}

/// Registries encode these integers either as JSON numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(i64),
    String(String),
}

impl StringOrNumber {
    fn into_i64<E: serde::de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    StringOrNumber::deserialize(deserializer)?.into_i64()
}

fn optional_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_i64)
        .transpose()
}

/// Response from a token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libsweep::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// HTTP client for OCI registry operations.
///
/// The registry host comes from each [`Repository`] or [`Reference`], so one
/// client serves any number of registries. Tokens obtained from challenges
/// are memoized per scope for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    config: ClientConfig,
    tokens: Arc<Mutex<HashMap<String, String>>>,
}

impl Client {
    /// Creates a new client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| SweepError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            config,
            tokens: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Lists the manifests and child repositories of `repository`.
    ///
    /// Performs `GET /v2/<name>/tags/list`, following `Link` pagination and
    /// merging every page. Registries that do not implement the `manifest`
    /// and `child` extensions produce an empty [`Listing`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry is unreachable
    /// - The repository does not exist or access is denied
    /// - The response is not a valid tags listing
    pub async fn list_manifests(
        &self,
        repository: &Repository,
        credentials: &Credentials,
    ) -> Result<Listing> {
        let base_url = repository.base_url();
        let mut url = format!("{}/v2/{}/tags/list", base_url, repository.path());
        let mut manifests = BTreeMap::new();
        let mut children = Vec::new();

        loop {
            let response = self
                .send(Method::GET, &url, repository, credentials)
                .await?;

            let next_path = Self::extract_next_link(response.headers());
            let response = Self::check_response_status(response).await?;

            let page: TagsResponse = response.json().await.map_err(|e| {
                SweepError::validation_with_source("Failed to parse tags response", e)
            })?;

            if !page.name.is_empty() && page.name != repository.path() {
                return Err(SweepError::validation(format!(
                    "Registry returned tags for '{}' but expected '{}'",
                    page.name,
                    repository.path()
                )));
            }

            manifests.extend(page.manifest);
            children.extend(page.child);

            match next_path {
                Some(path) if path.starts_with("http://") || path.starts_with("https://") => {
                    url = path;
                }
                Some(path) => url = format!("{}{}", base_url, path),
                None => break,
            }
        }

        let manifests = manifests
            .into_iter()
            .map(|(digest, entry)| Ok((Digest::from_str(&digest)?, entry.into_info()?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Listing {
            manifests,
            children,
        })
    }

    /// Deletes a tag or digest reference.
    ///
    /// Performs `DELETE /v2/<name>/manifests/<reference>`. Any 2xx answer
    /// counts as success.
    pub async fn delete_reference(
        &self,
        reference: &Reference,
        credentials: &Credentials,
    ) -> Result<()> {
        let repository = reference.repository();
        let url = format!(
            "{}/v2/{}/manifests/{}",
            repository.base_url(),
            repository.path(),
            reference.api_reference()
        );

        let response = self
            .send(Method::DELETE, &url, repository, credentials)
            .await?;
        Self::check_response_status(response).await?;
        Ok(())
    }

    /// Sends a request, answering a Bearer challenge once if the registry asks.
    async fn send(
        &self,
        method: Method,
        url: &str,
        repository: &Repository,
        credentials: &Credentials,
    ) -> Result<Response> {
        let scope = Self::scope_for(repository);
        let cached = self.cached_token(&scope);

        let authorization = match &cached {
            Some(token) => Some(format!("Bearer {}", token)),
            None => credentials.to_header_value(),
        };

        let response = self
            .request(method.clone(), url, authorization.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| AuthChallenge::parse(v).ok())
            .filter(AuthChallenge::is_bearer);

        let Some(challenge) = challenge else {
            return Ok(response);
        };

        tracing::debug!(realm = %challenge.realm, scope = %scope, "answering token challenge");
        let token = self.fetch_token(&challenge, &scope, credentials).await?;
        self.remember_token(scope, token.clone());

        self.request(method, url, Some(&format!("Bearer {}", token)))
            .await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        authorization: Option<&str>,
    ) -> Result<Response> {
        let mut request = self.http_client.request(method, url);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e, url))
    }

    /// Exchanges credentials for a registry token at the challenge realm.
    async fn fetch_token(
        &self,
        challenge: &AuthChallenge,
        scope: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let mut query = vec![("scope", scope.to_string())];
        if let Some(service) = &challenge.service {
            query.push(("service", service.clone()));
        }

        let mut request = self.http_client.get(&challenge.realm).query(&query);
        if let Credentials::Basic { .. } = credentials
            && let Some(value) = credentials.to_header_value()
        {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e, &challenge.realm))?;
        let response = Self::check_response_status(response).await?;

        let body: TokenResponse = response.json().await.map_err(|e| {
            SweepError::validation_with_source("Failed to parse token response", e)
        })?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SweepError::authentication(
                    format!("Token endpoint {} returned no token", challenge.realm),
                    None,
                )
            })
    }

    fn scope_for(repository: &Repository) -> String {
        format!("repository:{}:pull,delete", repository.path())
    }

    fn cached_token(&self, scope: &str) -> Option<String> {
        self.tokens
            .lock()
            .ok()
            .and_then(|tokens| tokens.get(scope).cloned())
    }

    fn remember_token(&self, scope: String, token: String) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(scope, token);
        }
    }

    /// Extracts the next page URL from the Link header.
    ///
    /// Format: `</v2/project/app/tags/list?n=100&last=v9>; rel="next"`
    fn extract_next_link(headers: &HeaderMap) -> Option<String> {
        let link_str = headers.get(LINK)?.to_str().ok()?;

        for link_part in link_str.split(',') {
            let link_part = link_part.trim();
            if (link_part.contains("rel=\"next\"") || link_part.contains("rel='next'"))
                && let Some(start) = link_part.find('<')
                && let Some(end) = link_part.find('>')
            {
                return Some(link_part[start + 1..end].to_string());
            }
        }

        None
    }

    /// Translates a reqwest error into a SweepError.
    fn translate_reqwest_error(&self, error: reqwest::Error, url: &str) -> SweepError {
        if error.is_timeout() {
            SweepError::network(format!(
                "Request to {} timed out after {} seconds",
                url, self.config.timeout_seconds
            ))
        } else if error.is_connect() {
            SweepError::network_with_source(format!("Failed to connect to {}", url), error)
        } else if error.is_request() {
            SweepError::network_with_source(format!("Failed to send request to {}", url), error)
        } else {
            SweepError::network_with_source(
                format!("Network error communicating with {}", url),
                error,
            )
        }
    }

    /// Checks the HTTP response status and translates errors to SweepError.
    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(SweepError::authentication(
                format!("Authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(SweepError::authentication(
                format!("Access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            StatusCode::NOT_FOUND => Err(SweepError::not_found("endpoint", url.as_str())),
            StatusCode::TOO_MANY_REQUESTS => Err(SweepError::rate_limit(
                format!("Rate limit exceeded for {}", url),
                retry_after,
            )),
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Err(SweepError::server(
                format!("Server error from {}: {}", url, error_body),
                status.as_u16(),
            )),
            _ => Err(SweepError::network(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_body
            ))),
        }
    }
}

impl ManifestEntry {
    fn into_info(self) -> Result<ManifestInfo> {
        Ok(ManifestInfo {
            created: from_millis(self.time_created_ms)?,
            uploaded: from_millis(self.time_uploaded_ms)?,
            tags: self.tag,
            media_type: self.media_type.filter(|m| !m.is_empty()),
            size_bytes: self.image_size_bytes.and_then(|s| u64::try_from(s).ok()),
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| SweepError::validation(format!("Timestamp {} is out of range", millis)))
}
