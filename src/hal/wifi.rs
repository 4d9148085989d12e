//! Wi-Fi station
//!
//! Coarse on/off around the blocking station driver: `enable` starts the
//! station and retries association on a fixed budget, `disable` stops it
//! and lets the RF settle.

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use super::{Radio, RadioError};
use crate::config::{RADIO_OFF_SETTLE_MS, WIFI_CONNECT_ATTEMPTS, WIFI_RETRY_DELAY_MS};

/// Station-mode radio
pub struct WifiRadio {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiRadio {
    /// Configure the station for `ssid`; the radio stays off until `enable`
    pub fn new(
        mut wifi: BlockingWifi<EspWifi<'static>>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, RadioError> {
        let client = ClientConfiguration {
            ssid: heapless::String::try_from(ssid).map_err(|_| RadioError::Credentials)?,
            password: heapless::String::try_from(password).map_err(|_| RadioError::Credentials)?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client))?;

        Ok(Self { wifi })
    }
}

impl Radio for WifiRadio {
    fn enable(&mut self) -> Result<(), RadioError> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }

        for attempt in 1..=WIFI_CONNECT_ATTEMPTS {
            match self.wifi.connect() {
                Ok(()) => {
                    self.wifi.wait_netif_up()?;
                    log::info!("wifi connected (attempt {})", attempt);
                    return Ok(());
                }
                Err(e) => log::debug!("wifi attempt {}: {}", attempt, e),
            }
            FreeRtos::delay_ms(WIFI_RETRY_DELAY_MS);
        }

        Err(RadioError::NotConnected {
            attempts: WIFI_CONNECT_ATTEMPTS,
        })
    }

    fn disable(&mut self) -> Result<(), RadioError> {
        self.wifi.stop()?;
        FreeRtos::delay_ms(RADIO_OFF_SETTLE_MS);
        log::info!("wifi off");
        Ok(())
    }
}
