//! Note-stream player
//!
//! Walks a binary note stream and drives a tone channel in real time.
//! Every sounded note gets a short pulse on the onset pin for external
//! envelope/trigger circuitry. Timing is busy-waited, so `play` blocks the
//! caller for the whole tune.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::notes::decode;
use super::tone::{Tone, ToneError};

/// Width of the note-onset pulse
pub const ONSET_PULSE_MS: u32 = 1;

/// Playback errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// Tone channel failed to start/stop
    Tone(ToneError),
    /// Onset or amplifier pin could not be driven
    Pin,
}

impl core::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Tone(e) => write!(f, "tone: {}", e),
            Self::Pin => write!(f, "output pin error"),
        }
    }
}

impl From<ToneError> for PlaybackError {
    fn from(e: ToneError) -> Self {
        PlaybackError::Tone(e)
    }
}

/// Monophonic sequencer
///
/// * `tone` - channel producing the notes
/// * `onset` - pulsed high for `ONSET_PULSE_MS` at each note start
/// * `amp` - amplifier enable, high for the duration of `play`
/// * `delay` - busy-wait timer
pub struct AudioSequencer<T, S, A, D> {
    tone: T,
    onset: S,
    amp: A,
    delay: D,
}

impl<T, S, A, D> AudioSequencer<T, S, A, D>
where
    T: Tone,
    S: OutputPin,
    A: OutputPin,
    D: DelayNs,
{
    /// Create a sequencer with onset and amplifier lines driven low
    pub fn new(tone: T, mut onset: S, mut amp: A, delay: D) -> Result<Self, PlaybackError> {
        onset.set_low().map_err(|_| PlaybackError::Pin)?;
        amp.set_low().map_err(|_| PlaybackError::Pin)?;
        Ok(Self { tone, onset, amp, delay })
    }

    /// Play `stream` to the end, blocking
    ///
    /// Returns the number of records played. A trailing partial record is
    /// dropped silently. The channel is stopped and the amplifier released
    /// even when a note fails.
    pub fn play(&mut self, stream: &[u8]) -> Result<usize, PlaybackError> {
        self.amp.set_high().map_err(|_| PlaybackError::Pin)?;

        let played = self.play_notes(stream);
        let stopped = self.tone.stop();
        let released = self.amp.set_low().map_err(|_| PlaybackError::Pin);

        let played = played?;
        stopped?;
        released?;
        Ok(played)
    }

    fn play_notes(&mut self, stream: &[u8]) -> Result<usize, PlaybackError> {
        let mut count = 0;

        for note in decode(stream) {
            let duration_ms = u32::from(note.duration_ms);

            if note.is_rest() {
                self.tone.stop()?;
                self.delay.delay_ms(duration_ms);
            } else {
                self.tone.start(note.frequency_hz)?;
                self.onset.set_high().map_err(|_| PlaybackError::Pin)?;
                self.delay.delay_ms(ONSET_PULSE_MS);
                self.onset.set_low().map_err(|_| PlaybackError::Pin)?;
                self.delay.delay_ms(duration_ms.saturating_sub(ONSET_PULSE_MS));
            }

            count += 1;
        }

        Ok(count)
    }
}
