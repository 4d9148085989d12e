//! General-purpose timer groups (legacy ESP-IDF timer driver)
//!
//! Timer ids map to (group, index) as `id / 2`, `id % 2`. Each armed timer
//! auto-reloads and calls its bound handler from the timer ISR.

use esp_idf_svc::sys::{
    esp, timer_alarm_t_TIMER_ALARM_EN, timer_autoreload_t_TIMER_AUTORELOAD_EN, timer_config_t,
    timer_count_dir_t_TIMER_COUNT_UP, timer_deinit, timer_disable_intr, timer_enable_intr,
    timer_init, timer_intr_mode_t_TIMER_INTR_LEVEL, timer_isr_callback_add,
    timer_isr_callback_remove, timer_pause, timer_set_alarm_value, timer_set_counter_value,
    timer_start, timer_start_t_TIMER_PAUSE,
};

use super::{alarm_ticks, HalError, IsrBinding, TimerHal, TIMER_DIVIDER};
use crate::audio::allocator::TimerId;

/// The chip's timer groups
pub struct EspTimers;

impl TimerHal for EspTimers {
    fn arm(&mut self, timer: TimerId, rate_hz: u32, isr: IsrBinding) -> Result<(), HalError> {
        let group = u32::from(timer.group());
        let index = u32::from(timer.timer());

        let config = timer_config_t {
            alarm_en: timer_alarm_t_TIMER_ALARM_EN,
            counter_en: timer_start_t_TIMER_PAUSE,
            intr_type: timer_intr_mode_t_TIMER_INTR_LEVEL,
            counter_dir: timer_count_dir_t_TIMER_COUNT_UP,
            auto_reload: timer_autoreload_t_TIMER_AUTORELOAD_EN,
            divider: TIMER_DIVIDER,
            ..Default::default()
        };

        // SAFETY: group/index come from a pool lease, so no other owner
        // drives this timer; the handler argument outlives the armed timer.
        unsafe {
            esp!(timer_init(group, index, &config))?;
            esp!(timer_set_counter_value(group, index, 0))?;
            esp!(timer_set_alarm_value(group, index, alarm_ticks(rate_hz)))?;
            esp!(timer_enable_intr(group, index))?;
            esp!(timer_isr_callback_add(group, index, Some(isr.handler), isr.arg, 0))?;
            esp!(timer_start(group, index))?;
        }
        Ok(())
    }

    fn disarm(&mut self, timer: TimerId) -> Result<(), HalError> {
        let group = u32::from(timer.group());
        let index = u32::from(timer.timer());

        // SAFETY: see `arm`.
        unsafe {
            esp!(timer_pause(group, index))?;
            esp!(timer_disable_intr(group, index))?;
            esp!(timer_isr_callback_remove(group, index))?;
            esp!(timer_deinit(group, index))?;
        }
        Ok(())
    }
}
