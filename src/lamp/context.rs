//! Lamp context: everything the lamp states share
//!
//! Holds the poll gate, the cached broadcast snapshot, the cached video
//! details and borrowed handles to the collaborators. Refresh discipline:
//!
//! | Reply                        | Cache       |
//! |------------------------------|-------------|
//! | transport error / non-200    | kept        |
//! | 200, empty result            | cleared     |
//! | 200, entries                 | replaced    |
//! | video 304                    | kept        |
//! | video 404                    | cleared     |

use alloc::string::String;

use crate::hal::{Clock, Radio};
use crate::lamp::desk::Desk;
use crate::net::{
    BroadcastStatus, LiveSource, LiveSummary, VideoDetails, VideoSource, STATUS_NOT_FOUND,
    STATUS_NOT_MODIFIED, STATUS_OK,
};
use crate::timestamp::parse_utc;

/// Elapsed-time gate bounding how often the states poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollGate {
    last_ms: u64,
}

impl PollGate {
    /// Gate whose interval starts counting at `now_ms`
    pub const fn new(now_ms: u64) -> Self {
        Self { last_ms: now_ms }
    }

    /// Milliseconds since the gate last opened
    #[inline]
    pub fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ms)
    }

    /// True once `interval_ms` has passed; opening restarts the interval
    pub fn poll_due(&mut self, now_ms: u64, interval_ms: u64) -> bool {
        if self.elapsed(now_ms) < interval_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}

/// Cached state of the tracked broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSnapshot {
    pub video_id: String,
    pub title: String,
    pub status: BroadcastStatus,
    /// Unix seconds; `None` if the API gave no usable time
    pub scheduled_start: Option<i64>,
}

impl BroadcastSnapshot {
    pub fn from_summary(summary: LiveSummary) -> Self {
        let scheduled_start = summary.start_scheduled.as_deref().and_then(|s| match parse_utc(s) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("start_scheduled '{}': {}", s, e);
                None
            }
        });

        Self {
            video_id: summary.id,
            title: summary.title,
            status: summary.status,
            scheduled_start,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.status == BroadcastStatus::Live
    }
}

/// Outcome of a video-metadata refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRefresh {
    /// No video source configured or nothing tracked
    Skipped,
    /// 304, transient failure or unexpected status; cache kept
    Unchanged,
    /// 200 with details; cache replaced
    Updated,
    /// 404 or 200 with no items; cache cleared
    Gone,
}

/// Shared lamp state
pub struct LampContext<'a> {
    live: &'a mut dyn LiveSource,
    video: Option<&'a mut dyn VideoSource>,
    radio: &'a mut dyn Radio,
    desk: &'a mut dyn Desk,
    clock: &'a dyn Clock,
    gate: PollGate,
    snapshot: Option<BroadcastSnapshot>,
    video_details: Option<VideoDetails>,
}

impl<'a> LampContext<'a> {
    /// Context with empty caches; the poll interval starts now
    pub fn new(
        live: &'a mut dyn LiveSource,
        video: Option<&'a mut dyn VideoSource>,
        radio: &'a mut dyn Radio,
        desk: &'a mut dyn Desk,
        clock: &'a dyn Clock,
    ) -> Self {
        let gate = PollGate::new(clock.monotonic_ms());
        Self {
            live,
            video,
            radio,
            desk,
            clock,
            gate,
            snapshot: None,
            video_details: None,
        }
    }

    /// Open the poll gate if `interval_ms` has passed since it last opened
    pub fn poll_due(&mut self, interval_ms: u64) -> bool {
        let now = self.clock.monotonic_ms();
        self.gate.poll_due(now, interval_ms)
    }

    pub fn snapshot(&self) -> Option<&BroadcastSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn video_details(&self) -> Option<&VideoDetails> {
        self.video_details.as_ref()
    }

    pub fn radio(&mut self) -> &mut dyn Radio {
        &mut *self.radio
    }

    pub fn desk(&mut self) -> &mut dyn Desk {
        &mut *self.desk
    }

    /// Poll the live-status source and apply the refresh discipline.
    ///
    /// Returns the snapshot after the refresh.
    pub fn refresh_snapshot(&mut self) -> Option<&BroadcastSnapshot> {
        match self.live.get_live() {
            Err(e) => {
                log::warn!("live poll failed: {}", e);
            }
            Ok(reply) if reply.status != STATUS_OK => {
                log::warn!("live poll returned HTTP {}", reply.status);
            }
            Ok(reply) => match reply.entries.into_iter().next() {
                None => {
                    log::info!("no live or upcoming broadcast");
                    self.snapshot = None;
                }
                Some(first) => {
                    let snapshot = BroadcastSnapshot::from_summary(first);
                    log::info!("{:?}: {} ({})", snapshot.status, snapshot.title, snapshot.video_id);
                    self.snapshot = Some(snapshot);
                }
            },
        }
        self.snapshot.as_ref()
    }

    /// Poll the video-metadata source for the tracked video.
    pub fn refresh_video(&mut self) -> VideoRefresh {
        let (Some(video), Some(snapshot)) = (self.video.as_deref_mut(), self.snapshot.as_ref())
        else {
            return VideoRefresh::Skipped;
        };

        match video.get_video_list(&snapshot.video_id) {
            Err(e) => {
                log::warn!("video poll failed: {}", e);
                VideoRefresh::Unchanged
            }
            Ok(reply) => match reply.status {
                STATUS_OK => match reply.details {
                    Some(details) => {
                        self.video_details = Some(details);
                        VideoRefresh::Updated
                    }
                    None => {
                        log::info!("video {} has no items", snapshot.video_id);
                        self.video_details = None;
                        VideoRefresh::Gone
                    }
                },
                STATUS_NOT_MODIFIED => VideoRefresh::Unchanged,
                STATUS_NOT_FOUND => {
                    log::info!("video {} removed", snapshot.video_id);
                    self.video_details = None;
                    VideoRefresh::Gone
                }
                status => {
                    log::warn!("video poll returned HTTP {}", status);
                    VideoRefresh::Unchanged
                }
            },
        }
    }

    /// Drop cached video details
    pub fn forget_video(&mut self) {
        self.video_details = None;
    }

    /// Whole minutes from now until the cached scheduled start, truncated toward zero.
    ///
    /// `None` without a snapshot, without a scheduled start, or before the
    /// wall clock is synced.
    pub fn minutes_until_start(&self) -> Option<i64> {
        let start = self.snapshot.as_ref()?.scheduled_start?;
        let now = self.clock.unix_time()?;
        Some((start - now) / 60)
    }
}
