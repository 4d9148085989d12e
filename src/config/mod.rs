//! Module: config
//!
//! Purpose: Boot-time configuration for RustOnAirDesklight.
//!
//! Architecture:
//! - Device document: JSON key/value blob (network + API credentials),
//!   provisioned into NVS and read once at boot (see `nvs`)
//! - Timing and board constants: fixed at build time
//!
//! A missing or malformed document is fatal at boot.

use alloc::string::String;
use serde::Deserialize;

pub mod nvs;

/// Idle state poll interval (5 minutes)
pub const IDLE_POLL_MS: u64 = 5 * 60 * 1000;

/// Waiting state poll interval (10 seconds)
pub const WAITING_POLL_MS: u64 = 10 * 1000;

/// OnAir state poll interval (5 minutes)
pub const ON_AIR_POLL_MS: u64 = 5 * 60 * 1000;

/// An upcoming broadcast closer than this puts the lamp in Waiting
pub const LEAD_WINDOW_MINUTES: i64 = 10;

/// Scheduler loop period
pub const TICK_MS: u32 = 1000;

/// Upper bound on any single HTTP exchange
pub const HTTP_TIMEOUT_MS: u64 = 10_000;

/// Association attempts before the radio gives up
pub const WIFI_CONNECT_ATTEMPTS: u32 = 10;

/// Pause between association attempts
pub const WIFI_RETRY_DELAY_MS: u32 = 1000;

/// Pause after the radio is switched off
pub const RADIO_OFF_SETTLE_MS: u32 = 1000;

/// SNTP sync checks at boot
pub const SNTP_ATTEMPTS: u32 = 10;

/// Board wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    /// Ambient light (active high)
    pub light: u8,
    /// Speaker, driven by LEDC
    pub speaker: u8,
    /// Note-onset trigger
    pub onset: u8,
    /// Amplifier enable
    pub amp: u8,
}

/// Wiring of the production board
pub const BOARD_PINS: BoardPins = BoardPins {
    light: 11,
    speaker: 34,
    onset: 33,
    amp: 12,
};

/// Device document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Wi-Fi network name
    pub ssid: String,
    /// Wi-Fi passphrase (empty for open networks)
    #[serde(default)]
    pub password: String,
    /// Live-status API key
    #[serde(alias = "key_holodex")]
    pub token: String,
    /// Tracked channel
    #[serde(alias = "channel_id")]
    pub channel_id: String,
    /// Video-metadata API key; video checks are skipped without it
    #[serde(default, alias = "key_youtube")]
    pub youtube_key: Option<String>,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Document is not valid JSON for `DeviceConfig`
    Malformed { line: usize, column: usize },
    /// Required field is empty
    Missing(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed { line, column } => {
                write!(f, "malformed config at {}:{}", line, column)
            }
            Self::Missing(field) => write!(f, "config field '{}' is empty", field),
        }
    }
}

impl DeviceConfig {
    /// Parse and validate a device document
    pub fn from_json(doc: &[u8]) -> Result<Self, ConfigError> {
        let config: DeviceConfig = serde_json::from_slice(doc).map_err(|e| ConfigError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::Missing("ssid"));
        }
        if self.token.is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        if self.channel_id.is_empty() {
            return Err(ConfigError::Missing("channelId"));
        }
        Ok(())
    }

    /// Video-metadata key, if one is configured
    pub fn youtube_key(&self) -> Option<&str> {
        self.youtube_key.as_deref().filter(|k| !k.is_empty())
    }
}
