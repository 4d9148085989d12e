//! Holodex live-status client
//!
//! One request per poll: the tracked channel's live and upcoming
//! broadcasts, earliest scheduled start first.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::{FetchError, LiveReply, LiveSummary, STATUS_OK};

/// Live endpoint
pub const LIVE_ENDPOINT: &str = "https://holodex.net/api/v2/live";

/// Most entries requested per poll
pub const LIVE_LIMIT: u8 = 5;

/// Request URL for `channel_id`
pub fn live_url(channel_id: &str) -> String {
    format!(
        "{}?channel_id={}&status=live,upcoming&limit={}&order=asc&sort=start_scheduled&include=live_info",
        LIVE_ENDPOINT, channel_id, LIVE_LIMIT
    )
}

/// Interpret a reply. Non-200 replies carry no entries and the body is not read.
pub fn parse_live(status: u16, body: &[u8]) -> Result<LiveReply, FetchError> {
    if status != STATUS_OK {
        return Ok(LiveReply {
            status,
            entries: Vec::new(),
        });
    }

    let entries: Vec<LiveSummary> = serde_json::from_slice(body).map_err(|_| FetchError::Parse)?;
    Ok(LiveReply { status, entries })
}

#[cfg(target_os = "espidf")]
pub use client::HolodexClient;

#[cfg(target_os = "espidf")]
mod client {
    use alloc::string::String;

    use super::{live_url, parse_live};
    use crate::net::http;
    use crate::net::{FetchError, LiveReply, LiveSource};

    /// Blocking Holodex client
    pub struct HolodexClient {
        url: String,
        token: String,
    }

    impl HolodexClient {
        pub fn new(token: &str, channel_id: &str) -> Self {
            Self {
                url: live_url(channel_id),
                token: token.into(),
            }
        }
    }

    impl LiveSource for HolodexClient {
        fn get_live(&mut self) -> Result<LiveReply, FetchError> {
            let headers = [("Accept", "application/json"), ("X-APIKEY", self.token.as_str())];
            let response = http::get(&self.url, &headers)?;
            log::debug!("live: HTTP {} ({} bytes)", response.status, response.body.len());
            parse_live(response.status, &response.body)
        }
    }
}
