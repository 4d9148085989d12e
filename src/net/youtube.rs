//! YouTube Data API video-metadata client
//!
//! Polls `videos?part=liveStreamingDetails` for the tracked broadcast with
//! `If-None-Match`, so an unchanged video costs a 304 and no body.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

use super::{FetchError, VideoDetails, VideoReply, STATUS_OK};

/// Videos endpoint
pub const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Request URL for `video_id`
pub fn video_url(video_id: &str, key: &str) -> String {
    format!("{}?part=liveStreamingDetails&id={}&key={}", VIDEOS_ENDPOINT, video_id, key)
}

#[derive(Deserialize)]
struct VideoListDoc {
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    live_streaming_details: Option<VideoDetails>,
}

/// Parsed 200 body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoList {
    pub etag: Option<String>,
    /// Details of the first item; `None` when the list is empty
    pub details: Option<VideoDetails>,
}

/// Parse a `videos` list body
pub fn parse_video_list(body: &[u8]) -> Result<VideoList, FetchError> {
    let doc: VideoListDoc = serde_json::from_slice(body).map_err(|_| FetchError::Parse)?;
    Ok(VideoList {
        etag: doc.etag,
        details: doc
            .items
            .into_iter()
            .next()
            .map(|item| item.live_streaming_details.unwrap_or_default()),
    })
}

/// Last ETag seen, scoped to one video id
#[derive(Debug, Default)]
pub struct EtagCache {
    video_id: String,
    etag: Option<String>,
}

impl EtagCache {
    pub const fn new() -> Self {
        Self {
            video_id: String::new(),
            etag: None,
        }
    }

    /// ETag to send for `video_id`; forgets the old one if the id changed
    pub fn for_video(&mut self, video_id: &str) -> Option<&str> {
        if self.video_id != video_id {
            self.video_id = video_id.into();
            self.etag = None;
        }
        self.etag.as_deref()
    }

    pub fn remember(&mut self, etag: String) {
        self.etag = Some(etag);
    }

    /// Turn a response into a reply, remembering the ETag of a 200
    pub fn absorb(&mut self, status: u16, body: &[u8]) -> Result<VideoReply, FetchError> {
        if status != STATUS_OK {
            return Ok(VideoReply { status, details: None });
        }

        let list = parse_video_list(body)?;
        if let Some(etag) = list.etag {
            self.remember(etag);
        }
        Ok(VideoReply {
            status,
            details: list.details,
        })
    }
}

#[cfg(target_os = "espidf")]
pub use client::YoutubeClient;

#[cfg(target_os = "espidf")]
mod client {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::{video_url, EtagCache};
    use crate::net::http;
    use crate::net::{FetchError, VideoReply, VideoSource};

    /// Blocking video-metadata client
    pub struct YoutubeClient {
        key: String,
        etags: EtagCache,
    }

    impl YoutubeClient {
        pub fn new(key: &str) -> Self {
            Self {
                key: key.into(),
                etags: EtagCache::new(),
            }
        }
    }

    impl VideoSource for YoutubeClient {
        fn get_video_list(&mut self, video_id: &str) -> Result<VideoReply, FetchError> {
            let url = video_url(video_id, &self.key);

            let response = {
                let mut headers: Vec<(&str, &str)> = Vec::with_capacity(2);
                headers.push(("Accept", "application/json"));
                if let Some(etag) = self.etags.for_video(video_id) {
                    headers.push(("If-None-Match", etag));
                }
                http::get(&url, &headers)?
            };

            log::debug!("video {}: HTTP {}", video_id, response.status);
            self.etags.absorb(response.status, &response.body)
        }
    }
}
