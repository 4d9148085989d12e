//! System clocks and SNTP
//!
//! Monotonic time comes from `esp_timer`; wall time from the C library
//! clock, which SNTP sets.

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::sys::{esp_timer_get_time, time, EspError};

use super::Clock;

/// Any wall time before this (2020-09-13) means the clock was never set
pub const MIN_VALID_UNIX_TIME: i64 = 1_600_000_000;

/// Milliseconds since boot
pub fn uptime_ms() -> u64 {
    // SAFETY: esp_timer is started by the IDF before app_main
    let us = unsafe { esp_timer_get_time() };
    (us / 1000) as u64
}

/// Board clock
pub struct EspClock;

impl Clock for EspClock {
    fn monotonic_ms(&self) -> u64 {
        uptime_ms()
    }

    fn unix_time(&self) -> Option<i64> {
        // SAFETY: time(NULL) only reads the RTC
        let now = unsafe { time(core::ptr::null_mut()) } as i64;
        (now >= MIN_VALID_UNIX_TIME).then_some(now)
    }
}

/// Start SNTP and check up to `attempts` times, `retry_delay_ms` apart, for
/// the first sync. Returns the service and whether the clock is set.
///
/// The service must be kept alive for the clock to keep syncing.
pub fn sync_wall_clock(
    attempts: u32,
    retry_delay_ms: u32,
) -> Result<(EspSntp<'static>, bool), EspError> {
    let sntp = EspSntp::new_default()?;
    for _ in 0..attempts {
        if sntp.get_sync_status() == SyncStatus::Completed {
            return Ok((sntp, true));
        }
        FreeRtos::delay_ms(retry_delay_ms);
    }
    let synced = sntp.get_sync_status() == SyncStatus::Completed;
    Ok((sntp, synced))
}
