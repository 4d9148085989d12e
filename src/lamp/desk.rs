//! The physical lamp: ambient light plus the speaker chain

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::audio::{AudioSequencer, PlaybackError, Tone};

/// Outputs the lamp states drive
pub trait Desk {
    /// Switch the ambient light.
    fn set_light(&mut self, on: bool);

    /// Play the onboard tune, blocking; returns the number of notes played.
    fn play_tune(&mut self) -> Result<usize, PlaybackError>;
}

/// Light pin + sequencer + tune
pub struct Desklight<L, T, S, A, D> {
    light: L,
    sequencer: AudioSequencer<T, S, A, D>,
    tune: &'static [u8],
}

impl<L, T, S, A, D> Desklight<L, T, S, A, D>
where
    L: OutputPin,
    T: Tone,
    S: OutputPin,
    A: OutputPin,
    D: DelayNs,
{
    /// Assemble the lamp with the light on
    pub fn new(
        mut light: L,
        sequencer: AudioSequencer<T, S, A, D>,
        tune: &'static [u8],
    ) -> Result<Self, PlaybackError> {
        light.set_high().map_err(|_| PlaybackError::Pin)?;
        Ok(Self {
            light,
            sequencer,
            tune,
        })
    }
}

impl<L, T, S, A, D> Desk for Desklight<L, T, S, A, D>
where
    L: OutputPin,
    T: Tone,
    S: OutputPin,
    A: OutputPin,
    D: DelayNs,
{
    fn set_light(&mut self, on: bool) {
        let result = if on {
            self.light.set_high()
        } else {
            self.light.set_low()
        };
        if result.is_err() {
            log::warn!("light pin did not switch {}", if on { "on" } else { "off" });
        }
    }

    fn play_tune(&mut self) -> Result<usize, PlaybackError> {
        self.sequencer.play(self.tune)
    }
}
