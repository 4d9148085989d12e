//! Hardware Abstraction Layer for RustOnAirDesklight.
//!
//! Thin seams around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! The traits here are the only things the tone engine and the lamp
//! state machine know about hardware; the ESP-IDF implementations live in
//! the target-gated submodules and the tests provide recording doubles.

use core::ffi::c_void;

use crate::audio::allocator::TimerId;
use crate::audio::tone::PwmChannel;

#[cfg(target_os = "espidf")]
pub mod clock;
#[cfg(target_os = "espidf")]
pub mod ledc;
#[cfg(target_os = "espidf")]
pub mod timer;
#[cfg(target_os = "espidf")]
pub mod wifi;

/// Base clock of the general-purpose timers (APB)
pub const APB_CLOCK_HZ: u32 = 80_000_000;

/// Prescaler applied to the timer clock (smallest the hardware accepts)
pub const TIMER_DIVIDER: u32 = 2;

/// Effective timer tick rate
pub const TIMER_TICK_HZ: u32 = APB_CLOCK_HZ / TIMER_DIVIDER;

/// Interrupt entry point, in the shape ESP-IDF timer callbacks take.
///
/// Returns whether a higher-priority task was woken (always `false` here).
pub type IsrFn = unsafe extern "C" fn(arg: *mut c_void) -> bool;

/// Interrupt handler plus the argument it is invoked with
#[derive(Debug, Clone, Copy)]
pub struct IsrBinding {
    pub handler: IsrFn,
    pub arg: *mut c_void,
}

/// Raw driver error code (`esp_err_t` on device)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalError(pub i32);

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "driver error {}", self.0)
    }
}

#[cfg(target_os = "espidf")]
impl From<esp_idf_svc::sys::EspError> for HalError {
    fn from(e: esp_idf_svc::sys::EspError) -> Self {
        HalError(e.code())
    }
}

/// Periodic hardware timers driving the tone interrupts
pub trait TimerHal {
    /// Fire `isr` every `1 / rate_hz` seconds on `timer` until disarmed.
    fn arm(&mut self, timer: TimerId, rate_hz: u32, isr: IsrBinding) -> Result<(), HalError>;

    /// Stop `timer` and detach its handler.
    fn disarm(&mut self, timer: TimerId) -> Result<(), HalError>;
}

/// PWM peripheral registers touched by the tone engine
///
/// `write_duty` is called from interrupt context and must be a handful of
/// register writes.
pub trait PwmRegisters: Sync {
    /// Output-signal routing word of `pin` (GPIO matrix FUNCn_OUT_SEL_CFG).
    fn out_signal(&self, pin: u8) -> u32;

    /// Load `duty` (already shifted into the duty field) into `channel`,
    /// then latch it with the duty-start and parameter-update bits.
    fn write_duty(&self, channel: PwmChannel, duty: u32);
}

/// Network radio collaborator
pub trait Radio {
    /// Bring the station up; blocks until associated or the retry budget runs out.
    fn enable(&mut self) -> Result<(), RadioError>;

    /// Take the station down.
    fn disable(&mut self) -> Result<(), RadioError>;
}

/// Radio errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Driver call failed
    Driver(i32),
    /// No association within the retry budget
    NotConnected { attempts: u32 },
    /// SSID or passphrase does not fit the driver's configuration
    Credentials,
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Driver(code) => write!(f, "wifi driver error {}", code),
            Self::NotConnected { attempts } => {
                write!(f, "not connected after {} attempts", attempts)
            }
            Self::Credentials => write!(f, "ssid or password too long"),
        }
    }
}

#[cfg(target_os = "espidf")]
impl From<esp_idf_svc::sys::EspError> for RadioError {
    fn from(e: esp_idf_svc::sys::EspError) -> Self {
        RadioError::Driver(e.code())
    }
}

/// Time sources used by the state machine
pub trait Clock {
    /// Monotonic milliseconds since boot.
    fn monotonic_ms(&self) -> u64;

    /// Wall-clock Unix seconds, `None` until the clock has been synced.
    fn unix_time(&self) -> Option<i64>;
}

/// Alarm value for a periodic timer firing at `rate_hz`, rounded to nearest
#[inline]
pub fn alarm_ticks(rate_hz: u32) -> u64 {
    let rate = rate_hz.max(1) as u64;
    ((TIMER_TICK_HZ as u64 + rate / 2) / rate).max(1)
}
