//! Lamp states
//!
//! ```text
//!            live                         not live / gone / ended
//!   Idle ───────────────────▶ OnAir ─────────────────────────▶ Idle
//!    │  ▲                       ▲
//!    │  │ absent / > 10 min     │ live
//!    ▼  │                       │
//!   Waiting ────────────────────┘
//!    (upcoming < 10 min)
//! ```
//!
//! Each state polls only when its own interval has passed on the shared
//! gate, so the poll rate is bounded by elapsed time alone.

use super::context::{LampContext, VideoRefresh};
use super::fsm::State;
use crate::config::{IDLE_POLL_MS, LEAD_WINDOW_MINUTES, ON_AIR_POLL_MS, WAITING_POLL_MS};
use crate::net::BroadcastStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampState {
    /// Nothing imminent; slow polling
    Idle,
    /// A broadcast starts within the lead window; fast polling
    Waiting,
    /// The tracked broadcast is live; light off
    OnAir,
}

impl LampState {
    /// Minimum time between polls in this state
    pub const fn poll_interval_ms(self) -> u64 {
        match self {
            LampState::Idle => IDLE_POLL_MS,
            LampState::Waiting => WAITING_POLL_MS,
            LampState::OnAir => ON_AIR_POLL_MS,
        }
    }
}

impl<'a> State<LampContext<'a>> for LampState {
    fn on_enter(self, ctx: &mut LampContext<'a>) {
        if self == LampState::OnAir {
            go_on_air(ctx);
        }
    }

    fn on_exit(self, ctx: &mut LampContext<'a>) {
        if self == LampState::OnAir {
            ctx.desk().set_light(true);
        }
    }

    fn update(self, ctx: &mut LampContext<'a>) -> Option<Self> {
        if !ctx.poll_due(self.poll_interval_ms()) {
            return None;
        }
        ctx.refresh_snapshot();

        match self {
            LampState::Idle => idle_update(ctx),
            LampState::Waiting => waiting_update(ctx),
            LampState::OnAir => on_air_update(ctx),
        }
    }
}

fn idle_update(ctx: &mut LampContext<'_>) -> Option<LampState> {
    let snapshot = ctx.snapshot()?;
    if snapshot.is_live() {
        return Some(LampState::OnAir);
    }
    if snapshot.status != BroadcastStatus::Upcoming {
        return None;
    }

    match ctx.minutes_until_start() {
        Some(minutes) if minutes < LEAD_WINDOW_MINUTES => Some(LampState::Waiting),
        _ => None,
    }
}

fn waiting_update(ctx: &mut LampContext<'_>) -> Option<LampState> {
    let Some(snapshot) = ctx.snapshot() else {
        return Some(LampState::Idle);
    };
    if snapshot.is_live() {
        return Some(LampState::OnAir);
    }

    match ctx.minutes_until_start() {
        Some(minutes) if minutes > LEAD_WINDOW_MINUTES => Some(LampState::Idle),
        _ => None,
    }
}

fn on_air_update(ctx: &mut LampContext<'_>) -> Option<LampState> {
    match ctx.snapshot() {
        Some(snapshot) if snapshot.is_live() => {}
        _ => return Some(LampState::Idle),
    }

    match ctx.refresh_video() {
        VideoRefresh::Gone => Some(LampState::Idle),
        _ if ctx.video_details().is_some_and(|d| d.has_ended()) => {
            log::info!("broadcast ended");
            Some(LampState::Idle)
        }
        _ => None,
    }
}

/// Radio off, light off, tune, radio on. Blocks for the whole tune.
fn go_on_air(ctx: &mut LampContext<'_>) {
    ctx.forget_video();

    if let Err(e) = ctx.radio().disable() {
        log::warn!("radio off failed: {}", e);
    }

    ctx.desk().set_light(false);
    match ctx.desk().play_tune() {
        Ok(notes) => log::info!("played {} notes", notes),
        Err(e) => log::error!("playback failed: {}", e),
    }

    if let Err(e) = ctx.radio().enable() {
        log::error!("radio on failed: {}", e);
    }
}
