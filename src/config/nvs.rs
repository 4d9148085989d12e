//! NVS storage of the device document.
//!
//! The JSON document is provisioned as a single blob under
//! `desklight/config` and read once at boot. The firmware never writes it.

use super::{ConfigError, DeviceConfig};

#[cfg(target_os = "espidf")]
use alloc::vec;
#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// NVS namespace of the device document
pub const NVS_NAMESPACE: &str = "desklight";

/// NVS key of the device document
pub const CONFIG_KEY: &str = "config";

/// Largest document accepted
pub const MAX_CONFIG_LEN: usize = 1024;

/// NVS operation errors
#[derive(Debug)]
pub enum NvsError {
    /// NVS partition or namespace could not be opened
    #[cfg(target_os = "espidf")]
    InitFailed(EspError),
    /// NVS read error
    #[cfg(target_os = "espidf")]
    IoError(EspError),
    /// Document has not been provisioned
    Missing,
    /// Document exceeds `MAX_CONFIG_LEN`
    TooLarge { len: usize },
    /// Document is present but invalid
    Invalid(ConfigError),
    /// Feature not available on this platform
    #[cfg(not(target_os = "espidf"))]
    NotAvailable,
}

impl core::fmt::Display for NvsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            #[cfg(target_os = "espidf")]
            Self::InitFailed(e) => write!(f, "nvs init failed: {}", e),
            #[cfg(target_os = "espidf")]
            Self::IoError(e) => write!(f, "nvs read failed: {}", e),
            Self::Missing => write!(f, "{}/{} not provisioned", NVS_NAMESPACE, CONFIG_KEY),
            Self::TooLarge { len } => write!(f, "config blob too large ({} bytes)", len),
            Self::Invalid(e) => write!(f, "{}", e),
            #[cfg(not(target_os = "espidf"))]
            Self::NotAvailable => write!(f, "nvs not available on this platform"),
        }
    }
}

#[cfg(target_os = "espidf")]
impl From<EspError> for NvsError {
    fn from(e: EspError) -> Self {
        NvsError::IoError(e)
    }
}

impl From<ConfigError> for NvsError {
    fn from(e: ConfigError) -> Self {
        NvsError::Invalid(e)
    }
}

/// Read and parse the device document from `partition`
#[cfg(target_os = "espidf")]
pub fn load_device_config(partition: EspDefaultNvsPartition) -> Result<DeviceConfig, NvsError> {
    let storage = EspNvs::new(partition, NVS_NAMESPACE, false).map_err(NvsError::InitFailed)?;

    let len = storage.blob_len(CONFIG_KEY)?.ok_or(NvsError::Missing)?;
    if len > MAX_CONFIG_LEN {
        return Err(NvsError::TooLarge { len });
    }

    let mut buf = vec![0u8; len];
    let doc = storage.get_blob(CONFIG_KEY, &mut buf)?.ok_or(NvsError::Missing)?;

    Ok(parse_document(doc)?)
}

/// Stub for non-ESP platforms
#[cfg(not(target_os = "espidf"))]
pub fn load_device_config() -> Result<DeviceConfig, NvsError> {
    Err(NvsError::NotAvailable)
}

/// Parse a stored document; a NUL terminator left by provisioning tools is tolerated
pub fn parse_document(doc: &[u8]) -> Result<DeviceConfig, ConfigError> {
    let end = doc.iter().position(|&b| b == 0).unwrap_or(doc.len());
    DeviceConfig::from_json(&doc[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvs_namespace_constant() {
        assert_eq!(NVS_NAMESPACE, "desklight");
        assert_eq!(CONFIG_KEY, "config");
    }

    #[test]
    fn test_parse_document_strips_nul() {
        let doc = b"{\"ssid\":\"a\",\"token\":\"t\",\"channelId\":\"c\"}\0\0";
        let config = parse_document(doc).unwrap();
        assert_eq!(config.ssid, "a");
    }

    #[test]
    fn test_stub_not_available() {
        assert!(matches!(load_device_config(), Err(NvsError::NotAvailable)));
    }
}
