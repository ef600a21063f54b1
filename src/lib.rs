//! # JW Platform client for Rust
//!
//! A signed, rate-limit-aware client for the JW Platform v1 API, plus
//! fetchers that assemble complete collections from its paged list
//! endpoints: a channel with all of its videos, and a video with all of its
//! conversions.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jwplatform::{
//!     default_video_transform, BusEvent, ChannelContext, ClientBuilder, EventBus, Pattern,
//!     ResourceKey, VideoFetcher, VideoSpec,
//! };
//!
//! struct LogBus;
//!
//! impl EventBus for LogBus {
//!     fn broadcast(&self, pattern: Pattern, event: BusEvent) {
//!         eprintln!("{:?}: {}", pattern.level, event.message);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> jwplatform::Result<()> {
//!     let bus = Arc::new(LogBus);
//!     let client = Arc::new(
//!         ClientBuilder::new()
//!             .api_key("my-api-key")
//!             .secret_key("my-secret-key")
//!             .max_results(100)
//!             .bus(bus.clone())
//!             .build()?,
//!     );
//!
//!     let fetcher = VideoFetcher::new(client, bus, Arc::new(default_video_transform));
//!     let spec = VideoSpec {
//!         channel: "my-channel".into(),
//!         kind: "videoSpec".into(),
//!         id: "spec-jwplayer-video-617kMdbG".into(),
//!         video: ResourceKey { key: "617kMdbG".into() },
//!     };
//!
//!     let record = fetcher.fetch(&spec, &ChannelContext::new("my-channel")).await?;
//!     println!("{} ({} sources)", record.title, record.sources.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Rate limiting
//!
//! When the API answers 429 the client's [`RateLimitGate`] closes until the
//! server's `rate_limit.reset` time (plus one second) has passed. Calls made
//! in the meantime fail with [`JwPlatformError::RateLimitBlocked`] without
//! touching the network.

mod bus;
mod client;
mod errors;
mod models;
mod pagination;
mod playlist;
mod rate_limit;
mod signature;
mod transform;
mod video;

pub use bus::{
    BusEvent, CommandDispatcher, CommandSelector, CreatedSpec, EventBus, Level, Pattern,
    VideoItemSpec,
};
pub use client::{Client, ClientBuilder, ClientConfig};
pub use errors::{BadResponseReason, JwPlatformError, Result};
pub use models::{
    Channel, ChannelContext, ChannelSecrets, Collection, CollectionSpec, Conversion,
    ConversionsPage, Credentials, Image, ItemCount, PageQuery, PlaylistList, PlaylistPayload,
    Relationship, RelationshipList, Relationships, ResourceKey, Source, Video, VideoPayload,
    VideoRecord, VideoSpec, VideosPage,
};
pub use pagination::{fetch_pages, plan_pages};
pub use playlist::{CollectionTransform, PlaylistFetcher};
pub use rate_limit::{reset_seconds, RateLimitGate, DEFAULT_RESET_SECONDS};
pub use signature::{concat_query_parameters, sign, SignedQuery};
pub use transform::{default_collection_transform, default_video_transform, format_release_date};
pub use video::{VideoFetcher, VideoTransform, VideoWithConversions};
