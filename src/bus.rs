//! Collaborators the client reports to and delegates item creation to.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::Result;
use crate::models::Video;

/// Severity a notification is broadcast under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// `{level: "..."}` routing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pattern {
    pub level: Level,
}

impl Pattern {
    pub fn info() -> Self {
        Self { level: Level::Info }
    }

    pub fn warn() -> Self {
        Self { level: Level::Warn }
    }

    pub fn error() -> Self {
        Self { level: Level::Error }
    }
}

/// Notification payload. Errors carry the originating spec, the error text
/// and its code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl BusEvent {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Fire-and-forget event bus.
pub trait EventBus: Send + Sync {
    fn broadcast(&self, pattern: Pattern, event: BusEvent);
}

/// `{role, cmd}` selector for a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSelector {
    pub role: String,
    pub cmd: String,
}

impl CommandSelector {
    /// `{role: "catalog", cmd: "setItemSpec"}`.
    pub fn set_item_spec() -> Self {
        Self {
            role: "catalog".to_string(),
            cmd: "setItemSpec".to_string(),
        }
    }
}

/// Spec for one video item derived from a playlist.
#[derive(Debug, Clone, Serialize)]
pub struct VideoItemSpec {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub source: String,
    pub video: Video,
}

/// What the dispatcher reports back for a created item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSpec {
    /// e.g. `videoSpec`.
    pub kind: String,
    /// Identifier of the created resource.
    pub resource: String,
}

/// Creates downstream catalog items.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn send_command(&self, selector: CommandSelector, spec: VideoItemSpec) -> Result<CreatedSpec>;
}
