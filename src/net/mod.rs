//! Network collaborators
//!
//! The lamp only sees the `LiveSource` / `VideoSource` traits and the plain
//! reply types below. Response parsing is target-independent; the HTTP
//! transport exists only on ESP-IDF.

use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

pub mod holodex;
pub mod youtube;

#[cfg(target_os = "espidf")]
pub mod http;

/// HTTP 200
pub const STATUS_OK: u16 = 200;
/// HTTP 304, conditional request matched
pub const STATUS_NOT_MODIFIED: u16 = 304;
/// HTTP 404
pub const STATUS_NOT_FOUND: u16 = 404;

/// Largest response body read
pub const MAX_BODY_LEN: usize = 16 * 1024;

/// Fetch errors. All of them mean "no new information" to the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS or I/O failure (raw `esp_err_t`)
    Transport(i32),
    /// Body exceeds `MAX_BODY_LEN`
    TooLarge,
    /// Body is not the expected JSON
    Parse,
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(code) => write!(f, "transport error {}", code),
            Self::TooLarge => write!(f, "response body too large"),
            Self::Parse => write!(f, "unexpected response body"),
        }
    }
}

/// Broadcast state as reported by the live-status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    Live,
    Upcoming,
    #[default]
    #[serde(other)]
    None,
}

/// One entry of the live-status reply
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LiveSummary {
    /// Video id
    pub id: String,
    pub title: String,
    pub status: BroadcastStatus,
    /// ISO-8601 UTC
    pub start_scheduled: Option<String>,
}

/// Live-status reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveReply {
    pub status: u16,
    /// Ordered by scheduled start; empty only on 200 with nothing live or upcoming
    pub entries: Vec<LiveSummary>,
}

/// `liveStreamingDetails` of a video
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoDetails {
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub concurrent_viewers: Option<String>,
}

impl VideoDetails {
    /// Broadcast has finished
    pub fn has_ended(&self) -> bool {
        self.actual_end_time.is_some()
    }
}

/// Video-metadata reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoReply {
    pub status: u16,
    /// Present on 200 with at least one item
    pub details: Option<VideoDetails>,
}

/// Broadcast-status collaborator
pub trait LiveSource {
    fn get_live(&mut self) -> Result<LiveReply, FetchError>;
}

/// Video-metadata collaborator, conditional on the last ETag it saw
pub trait VideoSource {
    fn get_video_list(&mut self, video_id: &str) -> Result<VideoReply, FetchError>;
}
