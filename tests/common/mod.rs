//! Shared fakes and fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jwplatform::{
    BusEvent, Client, ClientBuilder, CommandDispatcher, CommandSelector, CreatedSpec, EventBus,
    Level, Pattern, Result, VideoItemSpec,
};
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

pub const API_KEY: &str = "fake-apiKey";
pub const SECRET_KEY: &str = "fake-secretKey";

/// Event bus that keeps everything it is given.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<(Level, BusEvent)>>,
}

impl RecordingBus {
    pub fn events(&self) -> Vec<(Level, BusEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }
}

impl EventBus for RecordingBus {
    fn broadcast(&self, pattern: Pattern, event: BusEvent) {
        self.events.lock().unwrap().push((pattern.level, event));
    }
}

/// Dispatcher that "creates" every item under the video's own key.
#[derive(Default)]
pub struct RecordingDispatcher {
    specs: Mutex<Vec<(CommandSelector, String)>>,
}

impl RecordingDispatcher {
    pub fn spec_ids(&self) -> Vec<String> {
        self.specs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn selectors(&self) -> Vec<CommandSelector> {
        self.specs
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn send_command(&self, selector: CommandSelector, spec: VideoItemSpec) -> Result<CreatedSpec> {
        self.specs.lock().unwrap().push((selector, spec.id.clone()));
        Ok(CreatedSpec {
            kind: spec.kind,
            resource: spec.video.key,
        })
    }
}

pub fn client(server: &MockServer, max_results: u64, bus: Option<Arc<RecordingBus>>) -> Client {
    let mut builder = ClientBuilder::new()
        .base_url(server.uri())
        .api_key(API_KEY)
        .secret_key(SECRET_KEY)
        .max_results(max_results);
    if let Some(bus) = bus {
        builder = builder.bus(bus);
    }
    builder.build().unwrap()
}

/// Requests the server saw for `path`, in arrival order.
pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}

pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn playlist_response(key: &str, total: u64) -> Value {
    json!({
        "status": "ok",
        "channel": {
            "key": key,
            "title": "Example Playlist",
            "description": "Eight short films",
            "type": "manual",
            "videos": {"total": total}
        }
    })
}

pub fn videos_page(keys: std::ops::Range<u64>, total: u64) -> Value {
    let videos: Vec<Value> = keys
        .map(|i| json!({"key": format!("video{i}"), "title": format!("Video {i}")}))
        .collect();
    json!({"status": "ok", "videos": videos, "total": total})
}

pub fn video_response(key: &str) -> Value {
    json!({
        "status": "ok",
        "video": {
            "key": key,
            "title": "Big Buck Bunny",
            "description": "A large rabbit",
            "duration": "596.50",
            "date": 1_482_575_700,
            "tags": "animation"
        }
    })
}

pub fn conversions_page(keys: std::ops::Range<u64>, total: u64) -> Value {
    let conversions: Vec<Value> = keys
        .map(|i| {
            json!({
                "key": format!("conv{i}"),
                "status": "Ready",
                "width": 320 * (i + 1),
                "height": 180 * (i + 1),
                "template": {"name": format!("rendition {i}"), "format": {"key": "mp4"}},
                "link": {
                    "protocol": "https",
                    "address": "content.jwplatform.com",
                    "path": format!("/videos/conv{i}.mp4")
                }
            })
        })
        .collect();
    json!({"status": "ok", "conversions": conversions, "total": total})
}
