//! LEDC and GPIO-matrix registers (ESP32-S2)
//!
//! The LEDC driver configures the channel once; afterwards the tone
//! interrupt rewrites the duty register directly, bypassing the driver
//! (which takes a spinlock and is far too slow at audio rates).

use core::ptr::{read_volatile, write_volatile};

use super::PwmRegisters;
use crate::audio::tone::PwmChannel;

const LEDC_BASE: usize = 0x3F41_9000;
const LEDC_CH_STRIDE: usize = 0x14;
const LEDC_CONF0: usize = 0x00;
const LEDC_DUTY: usize = 0x08;
const LEDC_CONF1: usize = 0x0C;

/// CONF0: latch new channel parameters
const LEDC_PARA_UP: u32 = 1 << 4;
/// CONF1: start applying the new duty
const LEDC_DUTY_START: u32 = 1 << 31;

const GPIO_FUNC0_OUT_SEL_CFG: usize = 0x6000_4554;

/// Memory-mapped LEDC low-speed channels
pub struct LedcRegisters;

impl LedcRegisters {
    #[inline(always)]
    fn channel_reg(channel: PwmChannel, offset: usize) -> *mut u32 {
        (LEDC_BASE + LEDC_CH_STRIDE * channel.index() + offset) as *mut u32
    }
}

impl PwmRegisters for LedcRegisters {
    fn out_signal(&self, pin: u8) -> u32 {
        let reg = (GPIO_FUNC0_OUT_SEL_CFG + 4 * pin as usize) as *const u32;
        // SAFETY: FUNCn_OUT_SEL_CFG exists for every GPIO number and reads have no side effects.
        unsafe { read_volatile(reg) }
    }

    #[inline(always)]
    fn write_duty(&self, channel: PwmChannel, duty: u32) {
        let duty_reg = Self::channel_reg(channel, LEDC_DUTY);
        let conf1 = Self::channel_reg(channel, LEDC_CONF1);
        let conf0 = Self::channel_reg(channel, LEDC_CONF0);

        // SAFETY: fixed LEDC register addresses; only the tone interrupt of
        // this channel writes them once the driver has configured it.
        unsafe {
            write_volatile(duty_reg, duty);
            write_volatile(conf1, read_volatile(conf1) | LEDC_DUTY_START);
            write_volatile(conf0, read_volatile(conf0) | LEDC_PARA_UP);
        }
    }
}
