//! SPWM tone channel
//!
//! One hardware timer + one LEDC channel. Every timer interrupt steps the
//! channel's waveform cursor and loads the next sine sample into the PWM
//! duty register, so the duty cycle traces one sine period every
//! `TABLE_LEN` interrupts. Arming the timer at `freq * TABLE_LEN` Hz gives
//! a coarse sine at `freq`.
//!
//! The cursor lives in a heap slot handed to the interrupt as its argument.
//! The interrupt is its only reader and writer; the control loop only arms
//! and disarms the timer and never touches the cursor.

use alloc::boxed::Box;
use core::ffi::c_void;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU8, Ordering};

use super::allocator::{TimerId, TimerLease, TimerPool};
use super::waveform::{next_index, SINE_TABLE, TABLE_LEN};
use crate::hal::{HalError, IsrBinding, IsrFn, PwmRegisters, TimerHal};

/// Number of LEDC channels a pin can be routed to
pub const PWM_CHANNELS: usize = 8;

/// GPIO matrix output signal index of LEDC low-speed channel 0
pub const LEDC_LS_SIG_OUT0: u32 = 79;

/// Bit position of the integer part in the LEDC duty register
pub const DUTY_SHIFT: u32 = 4;

/// Timer interrupts per generated sine period
pub const OVERSAMPLING: u32 = TABLE_LEN as u32;

/// Tone channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneError {
    /// Every hardware timer in the pool is already leased
    NoTimerAvailable,
    /// Pin output is not routed to an LEDC channel
    UnroutedPin { pin: u8, signal: u32 },
    /// Zero frequency passed to `start`
    InvalidFrequency,
    /// Timer driver rejected arm/disarm
    Timer(HalError),
}

impl core::fmt::Display for ToneError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoTimerAvailable => write!(f, "all hardware timers are in use"),
            Self::UnroutedPin { pin, signal } => {
                write!(f, "GPIO{} routed to signal {}, not an LEDC channel", pin, signal)
            }
            Self::InvalidFrequency => write!(f, "tone frequency must be non-zero"),
            Self::Timer(e) => write!(f, "timer: {}", e),
        }
    }
}

impl From<HalError> for ToneError {
    fn from(e: HalError) -> Self {
        ToneError::Timer(e)
    }
}

/// Something that can sound a frequency and fall silent
pub trait Tone {
    fn start(&mut self, freq_hz: u16) -> Result<(), ToneError>;
    fn stop(&mut self) -> Result<(), ToneError>;
}

/// LEDC channel index (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PwmChannel(u8);

impl PwmChannel {
    /// Channel `index`, if it exists
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < PWM_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Decode a GPIO matrix routing word into the LEDC channel it selects
    pub fn from_signal_route(route: u32) -> Option<Self> {
        let signal = route & 0xFF;
        signal
            .checked_sub(LEDC_LS_SIG_OUT0)
            .and_then(|index| u8::try_from(index).ok())
            .and_then(Self::new)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Waveform position of one channel
///
/// Written only from that channel's interrupt.
#[derive(Debug)]
pub struct WaveCursor(AtomicU8);

impl WaveCursor {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Return the sample under the cursor and step it by one (mod 32)
    #[inline]
    pub fn next_sample(&self) -> u8 {
        let index = self.0.load(Ordering::Relaxed);
        self.0.store(next_index(index), Ordering::Relaxed);
        SINE_TABLE[index as usize]
    }
}

impl Default for WaveCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side state of one channel
struct ToneSlot<R: 'static> {
    cursor: WaveCursor,
    regs: &'static R,
}

/// Timer interrupt for LEDC channel `CH`
///
/// # Safety
///
/// `arg` must point to the live `ToneSlot<R>` registered by `ToneChannel::start`.
unsafe extern "C" fn tone_isr<R: PwmRegisters + 'static, const CH: u8>(arg: *mut c_void) -> bool {
    // SAFETY: the slot outlives the armed timer; ToneChannel disarms before freeing it.
    let slot = unsafe { &*(arg as *const ToneSlot<R>) };
    let sample = slot.cursor.next_sample();
    slot.regs.write_duty(PwmChannel(CH), u32::from(sample) << DUTY_SHIFT);
    false
}

/// One pre-bound handler per LEDC channel, so the hot path has the channel
/// index as a constant and no lookup.
struct IsrTable<R>(PhantomData<R>);

impl<R: PwmRegisters + 'static> IsrTable<R> {
    const HANDLERS: [IsrFn; PWM_CHANNELS] = [
        tone_isr::<R, 0>,
        tone_isr::<R, 1>,
        tone_isr::<R, 2>,
        tone_isr::<R, 3>,
        tone_isr::<R, 4>,
        tone_isr::<R, 5>,
        tone_isr::<R, 6>,
        tone_isr::<R, 7>,
    ];
}

/// SPWM tone generator bound to one timer and one LEDC channel
pub struct ToneChannel<'p, T: TimerHal, R: PwmRegisters + 'static> {
    lease: TimerLease<'p>,
    channel: PwmChannel,
    timers: T,
    isr: IsrFn,
    slot: NonNull<ToneSlot<R>>,
    armed: bool,
}

impl<'p, T: TimerHal, R: PwmRegisters + 'static> ToneChannel<'p, T, R> {
    /// Bind a timer from `pool` to the LEDC channel currently driving `pin`
    ///
    /// The pin must already be configured as an LEDC output. Fails with
    /// `NoTimerAvailable` when the pool is exhausted.
    pub fn new(
        pin: u8,
        pool: &'p TimerPool,
        timers: T,
        regs: &'static R,
    ) -> Result<Self, ToneError> {
        let lease = pool.allocate()?;

        let signal = regs.out_signal(pin);
        let channel = PwmChannel::from_signal_route(signal)
            .ok_or(ToneError::UnroutedPin { pin, signal: signal & 0xFF })?;

        let slot = Box::new(ToneSlot {
            cursor: WaveCursor::new(),
            regs,
        });

        log::debug!(
            "tone channel: GPIO{} -> LEDC ch{}, timer {}",
            pin,
            channel.index(),
            lease.id().index()
        );

        Ok(Self {
            lease,
            channel,
            timers,
            isr: IsrTable::<R>::HANDLERS[channel.index()],
            slot: NonNull::from(Box::leak(slot)),
            armed: false,
        })
    }

    /// LEDC channel this tone writes to
    #[inline]
    pub fn channel(&self) -> PwmChannel {
        self.channel
    }

    /// Hardware timer leased for this tone
    #[inline]
    pub fn timer(&self) -> TimerId {
        self.lease.id()
    }

    /// Whether the timer is currently armed
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start producing `freq_hz` (restarts the timer if already running)
    pub fn start(&mut self, freq_hz: u16) -> Result<(), ToneError> {
        self.stop()?;
        if freq_hz == 0 {
            return Err(ToneError::InvalidFrequency);
        }

        let binding = IsrBinding {
            handler: self.isr,
            arg: self.slot.as_ptr().cast(),
        };
        self.timers
            .arm(self.lease.id(), u32::from(freq_hz) * OVERSAMPLING, binding)?;
        self.armed = true;
        Ok(())
    }

    /// Disarm the timer; no register writes happen until the next `start`
    pub fn stop(&mut self) -> Result<(), ToneError> {
        if self.armed {
            self.timers.disarm(self.lease.id())?;
            self.armed = false;
        }
        Ok(())
    }
}

impl<T: TimerHal, R: PwmRegisters + 'static> Tone for ToneChannel<'_, T, R> {
    fn start(&mut self, freq_hz: u16) -> Result<(), ToneError> {
        ToneChannel::start(self, freq_hz)
    }

    fn stop(&mut self) -> Result<(), ToneError> {
        ToneChannel::stop(self)
    }
}

impl<T: TimerHal, R: PwmRegisters + 'static> Drop for ToneChannel<'_, T, R> {
    fn drop(&mut self) {
        if self.armed && self.timers.disarm(self.lease.id()).is_err() {
            // Handler may still fire; leaking the slot keeps its pointer valid.
            log::error!("tone channel: timer {} failed to disarm", self.lease.id().index());
            return;
        }
        // SAFETY: the slot came from Box::leak in `new` and no armed timer references it.
        drop(unsafe { Box::from_raw(self.slot.as_ptr()) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_route() {
        assert_eq!(PwmChannel::from_signal_route(79), PwmChannel::new(0));
        assert_eq!(PwmChannel::from_signal_route(86), PwmChannel::new(7));
        // Upper bits of the routing word (inversion/enable flags) are ignored
        assert_eq!(PwmChannel::from_signal_route(0x400 | 81), PwmChannel::new(2));
    }

    #[test]
    fn test_channel_from_foreign_route() {
        assert_eq!(PwmChannel::from_signal_route(78), None);
        assert_eq!(PwmChannel::from_signal_route(87), None);
        assert_eq!(PwmChannel::from_signal_route(256), None);
    }

    #[test]
    fn test_cursor_walks_table() {
        let cursor = WaveCursor::new();
        for expected in SINE_TABLE.iter() {
            assert_eq!(cursor.next_sample(), *expected);
        }
        // Period: back at index 0
        assert_eq!(cursor.next_sample(), SINE_TABLE[0]);
    }
}
