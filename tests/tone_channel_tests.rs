//! Tone channel tests against a fake timer bench and register file

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;

use rust_onair_desklight::audio::allocator::TimerId;
use rust_onair_desklight::audio::{
    PwmChannel, TimerPool, ToneChannel, ToneError, MAX_TIMERS, SINE_TABLE,
};
use rust_onair_desklight::hal::{HalError, IsrBinding, PwmRegisters, TimerHal};

/// Routing word of a pin driven by LEDC channel 2
const ROUTE_CH2: u32 = 81;
const SPEAKER_PIN: u8 = 34;

struct FakeRegisters {
    route: u32,
    writes: Mutex<Vec<(usize, u32)>>,
}

impl FakeRegisters {
    fn leak(route: u32) -> &'static Self {
        Box::leak(Box::new(Self {
            route,
            writes: Mutex::new(Vec::new()),
        }))
    }

    fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.lock().unwrap().clone()
    }
}

impl PwmRegisters for FakeRegisters {
    fn out_signal(&self, _pin: u8) -> u32 {
        self.route
    }

    fn write_duty(&self, channel: PwmChannel, duty: u32) {
        self.writes.lock().unwrap().push((channel.index(), duty));
    }
}

#[derive(Default)]
struct Bench {
    armed: HashMap<u8, (u32, IsrBinding)>,
    arm_calls: u32,
    disarm_calls: u32,
}

/// Timer driver double: remembers armed handlers so tests can fire them
#[derive(Clone, Default)]
struct FakeTimers(Rc<RefCell<Bench>>);

impl FakeTimers {
    fn rate(&self, timer: TimerId) -> Option<u32> {
        self.0.borrow().armed.get(&timer.index()).map(|(rate, _)| *rate)
    }

    /// Run the timer's interrupt once; false if the timer is not armed
    fn fire(&self, timer: TimerId) -> bool {
        let binding = self.0.borrow().armed.get(&timer.index()).map(|(_, b)| *b);
        match binding {
            Some(b) => {
                unsafe { (b.handler)(b.arg) };
                true
            }
            None => false,
        }
    }
}

impl TimerHal for FakeTimers {
    fn arm(&mut self, timer: TimerId, rate_hz: u32, isr: IsrBinding) -> Result<(), HalError> {
        let mut bench = self.0.borrow_mut();
        bench.arm_calls += 1;
        if bench.armed.insert(timer.index(), (rate_hz, isr)).is_some() {
            return Err(HalError(-1));
        }
        Ok(())
    }

    fn disarm(&mut self, timer: TimerId) -> Result<(), HalError> {
        let mut bench = self.0.borrow_mut();
        bench.disarm_calls += 1;
        bench.armed.remove(&timer.index()).map(|_| ()).ok_or(HalError(-2))
    }
}

#[test]
fn test_resolves_channel_from_pin_route() {
    let pool = TimerPool::new(MAX_TIMERS);
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let tone = ToneChannel::new(SPEAKER_PIN, &pool, FakeTimers::default(), regs).unwrap();

    assert_eq!(tone.channel(), PwmChannel::new(2).unwrap());
    assert_eq!(tone.timer().index(), 0);
    assert!(!tone.is_armed());
}

#[test]
fn test_start_arms_at_oversampled_rate() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();

    tone.start(440).unwrap();
    assert!(tone.is_armed());
    assert_eq!(timers.rate(tone.timer()), Some(440 * 32));

    // Restart at a new pitch: disarm, then arm again
    tone.start(880).unwrap();
    assert_eq!(timers.rate(tone.timer()), Some(880 * 32));
    assert_eq!(timers.0.borrow().disarm_calls, 1);
}

#[test]
fn test_interrupts_trace_one_sine_period() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();

    tone.start(1000).unwrap();
    for _ in 0..33 {
        assert!(timers.fire(tone.timer()));
    }

    let writes = regs.writes();
    assert_eq!(writes.len(), 33);
    for (i, (channel, duty)) in writes.iter().take(32).enumerate() {
        assert_eq!(*channel, 2);
        assert_eq!(*duty, u32::from(SINE_TABLE[i]) << 4);
    }
    // 33rd interrupt wraps back to the first sample
    assert_eq!(writes[32], writes[0]);
}

#[test]
fn test_start_then_stop_leaves_timer_disarmed() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();

    for freq in [1u16, 261, 440, 4186, u16::MAX] {
        tone.start(freq).unwrap();
        tone.stop().unwrap();

        assert!(!tone.is_armed());
        assert_eq!(timers.rate(tone.timer()), None);
        assert!(!timers.fire(tone.timer()));
    }
    assert!(regs.writes().is_empty());
}

#[test]
fn test_stop_when_idle_is_noop() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();

    tone.stop().unwrap();
    tone.stop().unwrap();
    assert_eq!(timers.0.borrow().disarm_calls, 0);
}

#[test]
fn test_zero_frequency_rejected() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);
    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();

    assert_eq!(tone.start(0), Err(ToneError::InvalidFrequency));
    assert!(!tone.is_armed());
    assert_eq!(timers.0.borrow().arm_calls, 0);
}

#[test]
fn test_unrouted_pin_releases_timer() {
    let pool = TimerPool::new(MAX_TIMERS);
    // Signal 128: plain GPIO output, not LEDC
    let regs = FakeRegisters::leak(128);
    let result = ToneChannel::new(SPEAKER_PIN, &pool, FakeTimers::default(), regs);

    assert!(matches!(result, Err(ToneError::UnroutedPin { pin: 34, signal: 128 })));
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_fifth_channel_fails() {
    let pool = TimerPool::new(MAX_TIMERS);
    let regs = FakeRegisters::leak(ROUTE_CH2);

    let channels: Vec<_> = (0..MAX_TIMERS)
        .map(|_| ToneChannel::new(SPEAKER_PIN, &pool, FakeTimers::default(), regs).unwrap())
        .collect();
    let ids: Vec<u8> = channels.iter().map(|c| c.timer().index()).collect();
    assert_eq!(ids, [0, 1, 2, 3]);

    let fifth = ToneChannel::new(SPEAKER_PIN, &pool, FakeTimers::default(), regs);
    assert!(matches!(fifth, Err(ToneError::NoTimerAvailable)));
}

#[test]
fn test_drop_disarms_and_frees_timer() {
    let pool = TimerPool::new(MAX_TIMERS);
    let timers = FakeTimers::default();
    let regs = FakeRegisters::leak(ROUTE_CH2);

    let mut tone = ToneChannel::new(SPEAKER_PIN, &pool, timers.clone(), regs).unwrap();
    let id = tone.timer();
    tone.start(440).unwrap();
    drop(tone);

    assert_eq!(timers.rate(id), None);
    assert_eq!(pool.in_use(), 0);

    let again = ToneChannel::new(SPEAKER_PIN, &pool, timers, regs).unwrap();
    assert_eq!(again.timer(), id);
}
