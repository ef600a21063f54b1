//! Assembles a catalog collection from a JW Platform channel.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use crate::bus::{BusEvent, CommandDispatcher, CommandSelector, EventBus, Pattern, VideoItemSpec};
use crate::client::Client;
use crate::errors::{JwPlatformError, Result};
use crate::models::{Channel, ChannelContext, Collection, CollectionSpec, Relationship, Video};
use crate::pagination::{fetch_pages, plan_pages};

const VIDEO_SPEC_TYPE: &str = "videoSpec";
const VIDEO_SPEC_SOURCE: &str = "jwplayer-video-provider";

/// Maps a channel payload to a catalog collection.
pub type CollectionTransform = Arc<dyn Fn(&CollectionSpec, &Channel) -> Collection + Send + Sync>;

/// Fetches a channel with all of its videos, registers one item per video and
/// returns the transformed collection.
pub struct PlaylistFetcher {
    client: Arc<Client>,
    bus: Arc<dyn EventBus>,
    dispatcher: Arc<dyn CommandDispatcher>,
    transform: CollectionTransform,
    per_page: u64,
}

impl PlaylistFetcher {
    /// Uses the client's `max_results` as page size.
    pub fn new(
        client: Arc<Client>,
        bus: Arc<dyn EventBus>,
        dispatcher: Arc<dyn CommandDispatcher>,
        transform: CollectionTransform,
    ) -> Self {
        let per_page = client.max_results();
        Self {
            client,
            bus,
            dispatcher,
            transform,
            per_page,
        }
    }

    pub fn per_page(mut self, n: u64) -> Self {
        self.per_page = n.max(1);
        self
    }

    pub async fn fetch(&self, spec: &CollectionSpec, channel: &ChannelContext) -> Result<Collection> {
        let playlist_id = spec.playlist.key.as_str();
        let creds = channel.credentials();

        debug!("Getting Playlist - playlistId: {}", playlist_id);
        let Some(playlist) = self.client.get_playlist(playlist_id, creds).await? else {
            return Err(self.not_found(spec));
        };

        let total = playlist.total_videos();
        if total == 0 {
            debug!("Zero (0) Videos in Playlist - playlistId: {}", playlist_id);
        } else if total > self.per_page {
            debug!(
                "Playlist has {} videos, which is more than {} - playlistId: {}",
                total, self.per_page, playlist_id
            );
        }

        let client = &self.client;
        let videos = fetch_pages(plan_pages(total, self.per_page)?, move |page| async move {
            debug!("Getting Videos By Playlist - playlistId: {} {:?}", playlist_id, page);
            let res = client.get_videos_by_playlist(playlist_id, page, creds).await?;
            Ok(res.map(|p| p.videos).unwrap_or_default())
        })
        .await?;

        let relationships = self.register_videos(channel, videos).await?;

        let mut collection = (self.transform)(spec, &playlist.channel);
        collection.relationships.entities.data = relationships;
        Ok(collection)
    }

    /// Dispatch `setItemSpec` for every video, keeping video order.
    async fn register_videos(
        &self,
        channel: &ChannelContext,
        videos: Vec<Video>,
    ) -> Result<Vec<Relationship>> {
        let created = join_all(videos.into_iter().map(|video| {
            let spec = VideoItemSpec {
                channel: channel.id.clone(),
                kind: VIDEO_SPEC_TYPE.to_string(),
                id: format!("spec-jw-video-{}", video.key),
                source: VIDEO_SPEC_SOURCE.to_string(),
                video,
            };
            self.dispatcher
                .send_command(CommandSelector::set_item_spec(), spec)
        }))
        .await;

        created
            .into_iter()
            .map(|res| {
                res.map(|created| Relationship {
                    kind: created
                        .kind
                        .strip_suffix("Spec")
                        .unwrap_or(&created.kind)
                        .to_string(),
                    id: created.resource,
                })
            })
            .collect()
    }

    fn not_found(&self, spec: &CollectionSpec) -> JwPlatformError {
        let error = JwPlatformError::PlaylistNotFound(spec.playlist.key.clone());
        self.bus.broadcast(
            Pattern::error(),
            BusEvent {
                message: "playlist not found".to_string(),
                spec: serde_json::to_value(spec).ok(),
                error: Some(error.to_string()),
                code: Some(error.code().to_string()),
            },
        );
        error
    }
}
