//! # RustOnAirDesklight
//!
//! Firmware for a desk lamp/speaker that watches one live-streaming channel.
//! When the tracked broadcast goes live the lamp switches its radio off,
//! plays a tune through a software-PWM sine generator driven from a
//! hardware timer interrupt, and brings the radio back.
//!
//! ## Architecture
//!
//! - `audio`: waveform table, tone channels, timer pool, note-stream sequencer
//! - `lamp`: Idle / Waiting / OnAir state machine and its shared context
//! - `net`: live-status and video-metadata collaborators
//! - `hal`: hardware seams (timers, PWM registers, radio, clock)
//!
//! Everything except the ESP-IDF implementations in `hal` and the HTTP
//! transport in `net` is target-independent and tested on the host.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod audio;
pub mod config;
pub mod hal;
pub mod lamp;
pub mod logging;
pub mod net;
pub mod timestamp;

pub use audio::{AudioSequencer, ToneChannel, TimerPool, ONAIR_TUNE};
pub use config::DeviceConfig;
pub use lamp::{LampContext, LampState, StateMachine};
pub use logging::{LogStream, StreamLogger};
