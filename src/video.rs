//! Assembles a catalog video from a JW Platform video and its conversions.

use std::sync::Arc;

use tracing::debug;

use crate::bus::{BusEvent, EventBus, Pattern};
use crate::client::Client;
use crate::errors::{JwPlatformError, Result};
use crate::models::{ChannelContext, Conversion, Credentials, PageQuery, Video, VideoRecord, VideoSpec};
use crate::pagination::{fetch_pages, plan_pages};

/// Maps a video and its complete conversions list to a catalog video.
pub type VideoTransform =
    Arc<dyn Fn(&VideoSpec, &Video, &[Conversion]) -> VideoRecord + Send + Sync>;

/// A video merged with every one of its conversions.
#[derive(Debug, Clone)]
pub struct VideoWithConversions {
    pub video: Video,
    pub conversions: Vec<Conversion>,
}

pub struct VideoFetcher {
    client: Arc<Client>,
    bus: Arc<dyn EventBus>,
    transform: VideoTransform,
    per_page: u64,
}

impl VideoFetcher {
    /// Uses the client's `max_results` as page size.
    pub fn new(client: Arc<Client>, bus: Arc<dyn EventBus>, transform: VideoTransform) -> Self {
        let per_page = client.max_results();
        Self {
            client,
            bus,
            transform,
            per_page,
        }
    }

    pub fn per_page(mut self, n: u64) -> Self {
        self.per_page = n.max(1);
        self
    }

    pub async fn fetch(&self, spec: &VideoSpec, channel: &ChannelContext) -> Result<VideoRecord> {
        let merged = self.fetch_merged(spec, channel).await?;
        Ok((self.transform)(spec, &merged.video, &merged.conversions))
    }

    /// Look the video up, then collect all of its conversions.
    ///
    /// Conversions are only requested once the video is known to exist.
    pub async fn fetch_merged(
        &self,
        spec: &VideoSpec,
        channel: &ChannelContext,
    ) -> Result<VideoWithConversions> {
        let video_id = spec.video.key.as_str();
        let creds = channel.credentials();

        debug!("Getting Video - videoId: {}", video_id);
        let Some(payload) = self.client.get_video(video_id, creds).await? else {
            return Err(self.not_found(spec));
        };

        let conversions = self.fetch_conversions(video_id, creds).await?;
        Ok(VideoWithConversions {
            video: payload.video,
            conversions,
        })
    }

    /// The video record carries no conversions count, so the first page
    /// is read on its own for `total` and then stands in for offset 0.
    /// Only the remaining offsets are fetched concurrently.
    async fn fetch_conversions(
        &self,
        video_id: &str,
        creds: Option<&Credentials>,
    ) -> Result<Vec<Conversion>> {
        debug!("Getting Conversions for Video - videoId: {}", video_id);
        let first = self
            .client
            .get_conversions_by_video(video_id, PageQuery::single(self.per_page), creds)
            .await?
            .unwrap_or_default();

        let total = first.total;
        if total <= self.per_page {
            return Ok(first.conversions);
        }

        debug!(
            "Video has {} conversions, which is more than {} - videoId: {}",
            total, self.per_page, video_id
        );
        let remaining = plan_pages(total, self.per_page)?.into_iter().skip(1).collect();
        let client = &self.client;
        let rest = fetch_pages(remaining, move |page| async move {
            debug!("Getting Conversions for Video - videoId: {} {:?}", video_id, page);
            let res = client.get_conversions_by_video(video_id, page, creds).await?;
            Ok(res.map(|p| p.conversions).unwrap_or_default())
        })
        .await?;

        let mut conversions = first.conversions;
        conversions.extend(rest);
        Ok(conversions)
    }

    fn not_found(&self, spec: &VideoSpec) -> JwPlatformError {
        let error = JwPlatformError::VideoNotFound(spec.video.key.clone());
        self.bus.broadcast(
            Pattern::error(),
            BusEvent {
                message: "video not found".to_string(),
                spec: serde_json::to_value(spec).ok(),
                error: Some(error.to_string()),
                code: Some(error.code().to_string()),
            },
        );
        error
    }
}
