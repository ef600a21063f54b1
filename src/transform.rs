//! Default mappings from JW Platform payloads to catalog records.
//!
//! Applications with their own catalog shape pass different closures to
//! [`PlaylistFetcher`](crate::PlaylistFetcher) and
//! [`VideoFetcher`](crate::VideoFetcher).

use serde_json::{json, Value};

use crate::models::{
    field_f64_opt, field_str, Channel, Collection, CollectionSpec, Conversion, Image,
    Relationships, Source, Video, VideoRecord, VideoSpec,
};

const THUMBNAIL_HOST: &str = "https://assets-jpcust.jwpsrv.com/thumbs";
const THUMBNAIL_WIDTHS: [u32; 6] = [40, 120, 320, 480, 720, 1280];

pub fn default_collection_transform(_spec: &CollectionSpec, channel: &Channel) -> Collection {
    let fields = &channel.fields;
    Collection {
        id: format!("res-jwplayer-playlist-{}", channel.key),
        title: field_str(fields, "title"),
        kind: "collection".to_string(),
        description: field_str(fields, "description"),
        genres: split_list(&field_str(fields, "tags")),
        images: Vec::new(),
        meta: json!({
            "jwplayer": {
                "key": channel.key,
                "type": field_str(fields, "type"),
                "total": channel.videos.total,
            }
        }),
        release_date: None,
        relationships: Relationships::default(),
    }
}

pub fn default_video_transform(
    _spec: &VideoSpec,
    video: &Video,
    conversions: &[Conversion],
) -> VideoRecord {
    let fields = &video.fields;
    let duration = field_f64_opt(fields, "duration").unwrap_or(0.0);

    VideoRecord {
        id: format!("res-jwplayer-video-{}", video.key),
        kind: "video".to_string(),
        title: field_str(fields, "title"),
        description: field_str(fields, "description"),
        images: thumbnails(&video.key),
        sources: conversions.iter().filter_map(source_from_conversion).collect(),
        cast: split_list(&field_str(fields, "author")),
        duration: (duration * 1000.0).round().max(0.0) as u64,
        genres: Vec::new(),
        meta: json!({
            "jwplayer": {
                "key": video.key,
                "status": field_str(fields, "status"),
                "sourcetype": field_str(fields, "sourcetype"),
            }
        }),
        release_date: field_f64_opt(fields, "date").and_then(|secs| format_release_date(secs as i64)),
        tags: split_list(&field_str(fields, "tags")),
    }
}

/// RFC 3339 (UTC) rendering of a Unix timestamp in seconds.
pub fn format_release_date(unix_secs: i64) -> Option<String> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(unix_secs, 0).map(|dt| dt.to_rfc3339())
}

fn thumbnails(key: &str) -> Vec<Image> {
    THUMBNAIL_WIDTHS
        .iter()
        .map(|&width| Image {
            url: format!("{THUMBNAIL_HOST}/{key}-{width}.jpg"),
            width,
            label: format!("thumbnail-{width}"),
        })
        .collect()
}

/// Only conversions with a download link become playable sources.
fn source_from_conversion(conversion: &Conversion) -> Option<Source> {
    let link = conversion.fields.get("link")?.as_object()?;
    let address = field_str(link, "address");
    if address.is_empty() {
        return None;
    }
    let protocol = match field_str(link, "protocol") {
        p if p.is_empty() => "https".to_string(),
        p => p,
    };
    let url = format!("{protocol}://{address}{}", field_str(link, "path"));

    let template = conversion.fields.get("template");
    let label = template
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(&conversion.key)
        .to_string();
    let format = template
        .and_then(|t| t.get("format"))
        .and_then(|f| f.get("key"))
        .and_then(Value::as_str)
        .unwrap_or("");

    let (mime_type, source_type) = match format {
        "hls" | "m3u8" => ("application/x-mpegURL", "HLS"),
        "aac" | "m4a" => ("audio/mp4", "AAC"),
        "webm" => ("video/webm", "WEBM"),
        _ => ("video/mp4", "MP4"),
    };

    Some(Source {
        url,
        label,
        mime_type: mime_type.to_string(),
        source_type: source_type.to_string(),
        width: field_f64_opt(&conversion.fields, "width").unwrap_or(0.0) as u64,
        height: field_f64_opt(&conversion.fields, "height").unwrap_or(0.0) as u64,
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::ResourceKey;

    fn video_spec() -> VideoSpec {
        VideoSpec {
            channel: "fake-channel".into(),
            kind: "videoSpec".into(),
            id: "spec-jwplayer-video-617kMdbG".into(),
            video: ResourceKey {
                key: "617kMdbG".into(),
            },
        }
    }

    fn video() -> Video {
        serde_json::from_value(json!({
            "key": "617kMdbG",
            "title": "Big Buck Bunny",
            "description": "A rabbit",
            "duration": "596.50",
            "date": 1_482_575_700,
            "tags": "animation, short,",
            "author": "Blender Foundation"
        }))
        .unwrap()
    }

    fn conversion(key: &str, with_link: bool) -> Conversion {
        let mut value = json!({
            "key": key,
            "width": 1280,
            "height": 720,
            "template": {"name": "720p", "format": {"key": "mp4"}}
        });
        if with_link {
            value["link"] = json!({
                "protocol": "https",
                "address": "content.jwplatform.com",
                "path": format!("/videos/617kMdbG-{key}.mp4")
            });
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn video_transform_maps_core_fields() {
        let record = default_video_transform(&video_spec(), &video(), &[]);

        assert_eq!(record.id, "res-jwplayer-video-617kMdbG");
        assert_eq!(record.kind, "video");
        assert_eq!(record.title, "Big Buck Bunny");
        assert_eq!(record.duration, 596_500);
        assert_eq!(record.tags, vec!["animation", "short"]);
        assert_eq!(record.cast, vec!["Blender Foundation"]);
        assert_eq!(record.images.len(), 6);
        assert_eq!(record.release_date, format_release_date(1_482_575_700));
    }

    #[test]
    fn video_transform_keeps_only_linked_conversions() {
        let conversions = [conversion("a", true), conversion("b", false), conversion("c", true)];
        let record = default_video_transform(&video_spec(), &video(), &conversions);

        assert_eq!(record.sources.len(), 2);
        assert_eq!(
            record.sources[0].url,
            "https://content.jwplatform.com/videos/617kMdbG-a.mp4"
        );
        assert_eq!(record.sources[0].mime_type, "video/mp4");
        assert_eq!(record.sources[0].label, "720p");
        assert_eq!(record.sources[0].width, 1280);
    }

    #[test]
    fn release_date_is_rfc3339() {
        assert_eq!(
            format_release_date(0).as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn collection_transform_starts_without_relationships() {
        let channel: Channel = serde_json::from_value(json!({
            "key": "bITKS2O3",
            "title": "Playlist",
            "description": "Things",
            "videos": {"total": 8}
        }))
        .unwrap();
        let spec = CollectionSpec {
            channel: "fake-channel".into(),
            kind: "collectionSpec".into(),
            id: "spec-jwplayer-playlist-bITKS2O3".into(),
            playlist: ResourceKey {
                key: "bITKS2O3".into(),
            },
        };

        let collection = default_collection_transform(&spec, &channel);
        assert_eq!(collection.id, "res-jwplayer-playlist-bITKS2O3");
        assert_eq!(collection.title, "Playlist");
        assert_eq!(collection.meta["jwplayer"]["total"], 8);
        assert!(collection.relationships.entities.data.is_empty());
    }
}
