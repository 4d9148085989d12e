//! Audio subsystem: software-PWM (SPWM) tone synthesis
//!
//! Architecture:
//! - Waveform table: 32-sample quantized sine, shared by all channels
//! - Tone channel: hardware timer ISR steps the LEDC duty through the table
//! - Timer pool: exclusive timer ids, at most 4 live channels
//! - Sequencer: plays a binary note stream on one channel, blocking

pub mod allocator;
pub mod notes;
pub mod sequencer;
pub mod tone;
pub mod waveform;

pub use allocator::{TimerId, TimerLease, TimerPool, MAX_TIMERS};
pub use notes::{NoteEvent, NoteStream};
pub use sequencer::{AudioSequencer, PlaybackError};
pub use tone::{PwmChannel, Tone, ToneChannel, ToneError};
pub use waveform::{SINE_TABLE, TABLE_LEN};

/// Tune played when the tracked broadcast goes live
pub static ONAIR_TUNE: &[u8] = include_bytes!("../../assets/onair.bin");
