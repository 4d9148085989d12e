//! RustOnAirDesklight - Main entry point
//!
//! 1. Load the device document from NVS (fatal if absent or malformed)
//! 2. Bring Wi-Fi up (restart the chip if it never associates)
//! 3. Sync the wall clock over SNTP
//! 4. Set up the speaker chain: LEDC at 625 kHz / 7-bit, tone channel, pins
//! 5. Scheduler loop: one state-machine cycle and a log drain per second

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    app::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("desklight: firmware binary, build for an ESP-IDF target (xtensa-esp32s2-espidf)");
}

#[cfg(target_os = "espidf")]
mod app {
    use std::io::Write as _;

    use anyhow::anyhow;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::{Ets, FreeRtos};
    use esp_idf_svc::hal::gpio::PinDriver;
    use esp_idf_svc::hal::ledc::config::TimerConfig;
    use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use esp_idf_svc::hal::reset;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

    use rust_onair_desklight::audio::{
        AudioSequencer, TimerPool, ToneChannel, MAX_TIMERS, ONAIR_TUNE,
    };
    use rust_onair_desklight::config::nvs::load_device_config;
    use rust_onair_desklight::config::{BOARD_PINS, SNTP_ATTEMPTS, TICK_MS, WIFI_RETRY_DELAY_MS};
    use rust_onair_desklight::hal::clock::{sync_wall_clock, uptime_ms, EspClock};
    use rust_onair_desklight::hal::ledc::LedcRegisters;
    use rust_onair_desklight::hal::timer::EspTimers;
    use rust_onair_desklight::hal::wifi::WifiRadio;
    use rust_onair_desklight::hal::Radio;
    use rust_onair_desklight::lamp::{Desklight, LampContext, LampState, StateMachine};
    use rust_onair_desklight::logging::StreamLogger;
    use rust_onair_desklight::net::holodex::HolodexClient;
    use rust_onair_desklight::net::youtube::YoutubeClient;
    use rust_onair_desklight::net::VideoSource;

    /// LEDC carrier: 80 MHz / 2^7
    const PWM_CARRIER_HZ: u32 = 625_000;

    static LOGGER: StreamLogger = StreamLogger::new(uptime_ms);
    static TIMER_POOL: TimerPool = TimerPool::new(MAX_TIMERS);
    static LEDC_REGISTERS: LedcRegisters = LedcRegisters;

    /// UART console
    struct Console;

    impl core::fmt::Write for Console {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            std::io::stdout().write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
        }
    }

    fn drain_logs() {
        LOGGER.drain_to(&mut Console);
    }

    pub fn run() -> anyhow::Result<()> {
        esp_idf_svc::sys::link_patches();
        StreamLogger::init(&LOGGER, log::LevelFilter::Info)
            .map_err(|_| anyhow!("logger already installed"))?;
        log::info!("{}", env!("VERSION_STRING"));

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let config = load_device_config(nvs.clone()).map_err(|e| anyhow!("config: {}", e))?;
        log::info!("tracking channel {}", config.channel_id);

        let wifi = BlockingWifi::wrap(
            EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
            sysloop,
        )?;
        let mut radio = WifiRadio::new(wifi, &config.ssid, &config.password)
            .map_err(|e| anyhow!("wifi: {}", e))?;
        if let Err(e) = radio.enable() {
            log::error!("wifi: {}; restarting", e);
            drain_logs();
            reset::restart();
        }

        let (_sntp, synced) = sync_wall_clock(SNTP_ATTEMPTS, WIFI_RETRY_DELAY_MS)?;
        if !synced {
            log::warn!("wall clock not synced yet");
        }
        drain_logs();

        // The driver routes the pin and configures the channel; the tone
        // interrupt owns the duty register from here on.
        let pwm_timer = LedcTimerDriver::new(
            peripherals.ledc.timer0,
            &TimerConfig::new().frequency(PWM_CARRIER_HZ.Hz().into()).resolution(Resolution::Bits7),
        )?;
        let _speaker =
            LedcDriver::new(peripherals.ledc.channel0, &pwm_timer, peripherals.pins.gpio34)?;

        let tone = ToneChannel::new(BOARD_PINS.speaker, &TIMER_POOL, EspTimers, &LEDC_REGISTERS)
            .map_err(|e| anyhow!("tone channel: {}", e))?;
        let onset = PinDriver::output(peripherals.pins.gpio33)?;
        let amp = PinDriver::output(peripherals.pins.gpio12)?;
        let light = PinDriver::output(peripherals.pins.gpio11)?;

        let sequencer = AudioSequencer::new(tone, onset, amp, Ets)
            .map_err(|e| anyhow!("sequencer: {}", e))?;
        let mut desk = Desklight::new(light, sequencer, ONAIR_TUNE)
            .map_err(|e| anyhow!("light: {}", e))?;

        let mut live = HolodexClient::new(&config.token, &config.channel_id);
        let mut youtube = config.youtube_key().map(YoutubeClient::new);
        if youtube.is_none() {
            log::info!("no youtube key, end-of-broadcast comes from live status only");
        }
        let clock = EspClock;

        let mut ctx = LampContext::new(
            &mut live,
            youtube.as_mut().map(|y| y as &mut dyn VideoSource),
            &mut radio,
            &mut desk,
            &clock,
        );
        let mut fsm = StateMachine::new();
        fsm.start(LampState::Idle, &mut ctx);

        loop {
            fsm.run_cycle(&mut ctx);
            drain_logs();
            FreeRtos::delay_ms(TICK_MS);
        }
    }
}
