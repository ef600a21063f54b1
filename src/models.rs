use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API key pair used to sign a request.
///
/// Empty strings count as absent, so a partially filled value falls back to
/// the client defaults field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default, rename = "secretKey")]
    pub secret_key: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            secret_key: Some(secret_key.into()),
        }
    }
}

/// One page of a list endpoint: `result_limit` and optional `result_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: u64,
    pub offset: Option<u64>,
}

impl PageQuery {
    /// A single unpaged request for `limit` items.
    pub fn single(limit: u64) -> Self {
        Self {
            limit,
            offset: None,
        }
    }

    pub fn at(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset: Some(offset),
        }
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        let mut query = vec![("result_limit", self.limit.to_string())];
        if let Some(offset) = self.offset {
            query.push(("result_offset", offset.to_string()));
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Remote payloads
// ---------------------------------------------------------------------------

/// `{"total": n}` counter nested in a channel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ItemCount {
    #[serde(default)]
    pub total: u64,
}

/// A JW Platform channel (what the catalog calls a playlist).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Channel {
    pub key: String,
    #[serde(default)]
    pub videos: ItemCount,
    /// Every other field, untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A JW Platform video record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Video {
    pub key: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One encoded rendition of a video.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Conversion {
    #[serde(default)]
    pub key: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// GET /channels/list response.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistList {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub total: u64,
}

/// GET /channels/show response.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPayload {
    pub channel: Channel,
}

impl PlaylistPayload {
    /// Number of videos the channel holds, 0 when not reported.
    pub fn total_videos(&self) -> u64 {
        self.channel.videos.total
    }
}

/// GET /channels/videos/list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideosPage {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub total: u64,
}

/// GET /videos/show response.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoPayload {
    pub video: Video,
}

/// GET /videos/conversions/list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionsPage {
    #[serde(default)]
    pub conversions: Vec<Conversion>,
    #[serde(default)]
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Aggregation inputs and outputs
// ---------------------------------------------------------------------------

/// `{"key": "..."}` reference to a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceKey {
    pub key: String,
}

/// Request to build a catalog collection from a JW Platform channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionSpec {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub playlist: ResourceKey,
}

/// Request to build a catalog video from a JW Platform video.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoSpec {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub video: ResourceKey,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChannelSecrets {
    #[serde(default, rename = "jwPlatform")]
    pub jw_platform: Option<Credentials>,
}

/// The catalog channel an aggregation runs on behalf of.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChannelContext {
    pub id: String,
    #[serde(default)]
    pub secrets: ChannelSecrets,
}

impl ChannelContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secrets: ChannelSecrets::default(),
        }
    }

    pub fn with_credentials(mut self, creds: Credentials) -> Self {
        self.secrets.jw_platform = Some(creds);
        self
    }

    pub(crate) fn credentials(&self) -> Option<&Credentials> {
        self.secrets.jw_platform.as_ref()
    }
}

/// One entry of a record's relationship list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationshipList {
    pub data: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Relationships {
    pub entities: RelationshipList,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    pub width: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Source {
    pub url: String,
    pub label: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "sourceType")]
    pub source_type: String,
    pub width: u64,
    pub height: u64,
}

/// Catalog-ready collection produced by a collection transform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub genres: Vec<String>,
    pub images: Vec<Image>,
    pub meta: Value,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub relationships: Relationships,
}

/// Catalog-ready video produced by a video transform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub images: Vec<Image>,
    pub sources: Vec<Source>,
    pub cast: Vec<String>,
    /// Milliseconds.
    pub duration: u64,
    pub genres: Vec<String>,
    pub meta: Value,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    pub tags: Vec<String>,
}

/// Pull a string out of a payload's extra fields, or `""` if missing.
pub(crate) fn field_str(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Pull a number out of a payload's extra fields. JW Platform sends some
/// numbers as strings (`"duration": "123.45"`), so both forms are accepted.
pub(crate) fn field_f64_opt(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
