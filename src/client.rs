use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::errors::{BadResponseReason, JwPlatformError, Result};
use crate::models::{
    ConversionsPage, Credentials, PageQuery, PlaylistList, PlaylistPayload, VideoPayload,
    VideosPage,
};
use crate::rate_limit::RateLimitGate;
use crate::signature::SignedQuery;

const DEFAULT_BASE_URL: &str = "https://api.jwplatform.com";
const PATH_PREFIX: &str = "/v1";
const DEFAULT_MAX_RESULTS: u64 = 1000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_ENV: &str = "JWPLATFORM_API_KEY";
const SECRET_KEY_ENV: &str = "JWPLATFORM_SECRET_KEY";

/// Client settings as they appear in an application config file.
///
/// ```
/// let config: jwplatform::ClientConfig = serde_json::from_str(
///     r#"{"apiKey": "key", "secretKey": "secret", "maxResults": 50}"#,
/// ).unwrap();
/// assert_eq!(config.max_results, Some(50));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default, rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default, rename = "secretKey")]
    pub secret_key: Option<String>,
    #[serde(default, rename = "maxResults")]
    pub max_results: Option<u64>,
    /// Request timeout in seconds.
    #[serde(default, rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
}

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use jwplatform::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> jwplatform::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("my-api-key")
///     .secret_key("my-secret-key")
///     .max_results(100)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    secret_key: Option<String>,
    base_url: String,
    max_results: u64,
    timeout: Duration,
    bus: Option<Arc<dyn EventBus>>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_TIMEOUT,
            bus: None,
        }
    }

    /// Start from deserialized settings; unset fields keep their defaults.
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new();
        if let Some(url) = config.base_url {
            builder = builder.base_url(url);
        }
        builder.api_key = config.api_key;
        builder.secret_key = config.secret_key;
        if let Some(n) = config.max_results {
            builder = builder.max_results(n);
        }
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
    }

    /// Default API key, used when a call does not supply its own.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Default secret key, used when a call does not supply its own.
    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Override the base URL (defaults to `https://api.jwplatform.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Page size for list calls (defaults to 1000). Must be positive.
    pub fn max_results(mut self, n: u64) -> Self {
        self.max_results = n;
        self
    }

    /// Set the HTTP request timeout (defaults to 60 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Event bus to notify about rate limiting.
    pub fn bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Build the [`Client`].
    ///
    /// Keys not set on the builder are read from `JWPLATFORM_API_KEY` and
    /// `JWPLATFORM_SECRET_KEY`.
    ///
    /// Returns [`JwPlatformError::MissingCredentials`] if either key is still
    /// missing, and [`JwPlatformError::InvalidArgument`] for an empty base URL or
    /// a zero page size.
    pub fn build(self) -> Result<Client> {
        let api_key = non_empty(self.api_key)
            .or_else(|| non_empty(std::env::var(API_KEY_ENV).ok()))
            .ok_or(JwPlatformError::MissingCredentials("apiKey"))?;
        let secret_key = non_empty(self.secret_key)
            .or_else(|| non_empty(std::env::var(SECRET_KEY_ENV).ok()))
            .ok_or(JwPlatformError::MissingCredentials("secretKey"))?;

        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(JwPlatformError::InvalidArgument(
                "baseUrl is required".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(JwPlatformError::InvalidArgument(
                "maxResults must be a positive integer".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(JwPlatformError::Transport)?;

        Ok(Client {
            base_url,
            api_key,
            secret_key,
            max_results: self.max_results,
            http,
            gate: Arc::new(RateLimitGate::new(self.bus)),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed, rate-limit-aware JW Platform v1 client.
///
/// Every operation resolves credentials (per-call values override the client
/// defaults), refuses to send while the [`RateLimitGate`] is blocked, signs
/// the query and issues a GET. A 404 yields `Ok(None)`.
///
/// # Example
///
/// ```no_run
/// use jwplatform::ClientBuilder;
///
/// # async fn example() -> jwplatform::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("my-api-key")
///     .secret_key("my-secret-key")
///     .build()?;
///
/// if let Some(video) = client.get_video("617kMdbG", None).await? {
///     println!("{}", video.video.key);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client {
    base_url: String,
    api_key: String,
    secret_key: String,
    max_results: u64,
    http: reqwest::Client,
    gate: Arc<RateLimitGate>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Page size used by the aggregators.
    pub fn max_results(&self) -> u64 {
        self.max_results
    }

    pub fn rate_limit_gate(&self) -> &Arc<RateLimitGate> {
        &self.gate
    }

    /// Whether both default keys are set.
    ///
    /// Always `true` for a client returned by [`ClientBuilder::build`], which
    /// refuses to build without both keys.
    pub fn is_authenticated(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }

    /// `GET /v1/channels/list`
    pub async fn get_playlists(&self, creds: Option<&Credentials>) -> Result<Option<PlaylistList>> {
        self.request("/channels/list", Vec::new(), creds).await
    }

    /// `GET /v1/channels/show?channel_key=`
    pub async fn get_playlist(
        &self,
        playlist_id: &str,
        creds: Option<&Credentials>,
    ) -> Result<Option<PlaylistPayload>> {
        require_id("playlistId", playlist_id)?;
        let query = vec![("channel_key", playlist_id.to_string())];
        self.request("/channels/show", query, creds).await
    }

    /// `GET /v1/channels/videos/list?channel_key=&result_limit=&result_offset=`
    pub async fn get_videos_by_playlist(
        &self,
        playlist_id: &str,
        page: PageQuery,
        creds: Option<&Credentials>,
    ) -> Result<Option<VideosPage>> {
        require_id("playlistId", playlist_id)?;
        let mut query = vec![("channel_key", playlist_id.to_string())];
        query.extend(page.to_query());
        self.request("/channels/videos/list", query, creds).await
    }

    /// `GET /v1/videos/show?video_key=`
    pub async fn get_video(
        &self,
        video_id: &str,
        creds: Option<&Credentials>,
    ) -> Result<Option<VideoPayload>> {
        require_id("videoId", video_id)?;
        let query = vec![("video_key", video_id.to_string())];
        self.request("/videos/show", query, creds).await
    }

    /// `GET /v1/videos/conversions/list?video_key=&result_limit=&result_offset=`
    pub async fn get_conversions_by_video(
        &self,
        video_id: &str,
        page: PageQuery,
        creds: Option<&Credentials>,
    ) -> Result<Option<ConversionsPage>> {
        require_id("videoId", video_id)?;
        let mut query = vec![("video_key", video_id.to_string())];
        query.extend(page.to_query());
        self.request("/videos/conversions/list", query, creds).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn resolve_credentials<'a>(&'a self, creds: Option<&'a Credentials>) -> Result<(&'a str, &'a str)> {
        let pick = |explicit: Option<&'a String>, default: &'a str| {
            explicit
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };

        let api_key = pick(creds.and_then(|c| c.api_key.as_ref()), self.api_key.as_str());
        let secret_key = pick(creds.and_then(|c| c.secret_key.as_ref()), self.secret_key.as_str());

        if api_key.is_empty() {
            return Err(JwPlatformError::MissingCredentials("apiKey"));
        }
        if secret_key.is_empty() {
            return Err(JwPlatformError::MissingCredentials("secretKey"));
        }
        Ok((api_key, secret_key))
    }

    /// Sign and send one GET, then interpret the response.
    ///
    /// No retries: a 429 closes the gate and is surfaced as
    /// [`JwPlatformError::RateLimitExceeded`].
    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
        creds: Option<&Credentials>,
    ) -> Result<Option<T>> {
        let path = format!("{PATH_PREFIX}{path}");
        let (api_key, secret_key) = self.resolve_credentials(creds)?;

        // Checked right before signing: a concurrent call may have tripped it.
        self.gate.check(&path)?;

        let signed = SignedQuery::new(api_key, secret_key, &query);
        let url = format!("{}{}", self.base_url, path);

        debug!("Making JW Platform request to: {} with {} params", url, query.len());

        let response = self
            .http
            .get(&url)
            .query(&signed.pairs())
            .send()
            .await
            .map_err(JwPlatformError::Transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} returned 404", path);
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await.map_err(JwPlatformError::Transport)?;
        let body = parse_json_body(content_type, &text)?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let reset_at = body
                .get("rate_limit")
                .and_then(|r| r.get("reset"))
                .and_then(|v| v.as_i64());
            warn!("JW Platform has rate limited this application ({})", path);
            let cooldown = self.gate.block(reset_at, chrono::Utc::now().timestamp());
            return Err(JwPlatformError::RateLimitExceeded { cooldown });
        }

        if status != StatusCode::OK {
            return Err(JwPlatformError::Remote {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| BadResponseReason::Schema(e.to_string()).into())
    }
}

/// Interpret a response body that must be JSON.
fn parse_json_body(content_type: Option<String>, text: &str) -> Result<serde_json::Value> {
    let is_json = content_type
        .as_deref()
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"));
    if !is_json {
        return Err(BadResponseReason::ContentType(content_type).into());
    }
    if text.trim().is_empty() {
        return Err(BadResponseReason::EmptyBody.into());
    }
    serde_json::from_str(text).map_err(|e| BadResponseReason::Parse(e.to_string()).into())
}

fn require_id(name: &str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(JwPlatformError::InvalidArgument(format!("{name} is required")));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
