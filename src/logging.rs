//! Non-blocking logging for RustOnAirDesklight.
//!
//! # Architecture
//!
//! ```text
//! Any context              LogStream            Main loop
//! ───────────              ─────────            ─────────
//!
//! log::info!() ─────────▶ [L0][L1][L2] ──────▶ stdout (UART)
//! StreamLogger            lock-free            drain_to() once per tick
//! never blocks            ring buffer
//! ```
//!
//! Records go through the `log` facade into `StreamLogger`, which formats
//! into a fixed-size entry and pushes it into the ring. Nothing on the
//! logging path allocates or blocks; when the ring is full the record is
//! dropped and counted. The main loop drains the ring between scheduler
//! ticks, so the 1 s tick is never held up by the UART.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 120;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Milliseconds since boot.
    pub timestamp_ms: u64,
    /// Log level.
    pub level: Level,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_ms: 0,
        level: Level::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text; a UTF-8 sequence cut by truncation is dropped
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// One ring slot and its sequence stamp.
///
/// `seq == pos` means free for the producer at `pos`; `seq == pos + 1` means
/// committed and readable at `pos`.
struct Slot {
    seq: AtomicU32,
    entry: UnsafeCell<LogEntry>,
}

impl Slot {
    const EMPTY: Slot = Slot {
        seq: AtomicU32::new(0),
        entry: UnsafeCell::new(LogEntry::EMPTY),
    };
}

/// Lock-free bounded log stream (multiple producers, multiple consumers).
///
/// - Producers claim a position with CAS only when its slot is free
/// - A slot becomes readable after its writer commits the sequence stamp
/// - Push never blocks (drops message if full)
/// - Drain runs from the main loop
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: [Slot; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: a slot's entry is only touched by the one thread whose CAS won its
// position, and the sequence stamp orders the write before the read.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");
        assert!(N <= i32::MAX as usize);

        let mut slots = [Slot::EMPTY; N];
        let mut i = 0;
        while i < N {
            slots[i].seq = AtomicU32::new(i as u32);
            i += 1;
        }

        Self {
            slots,
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry, never blocks.
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    pub fn push(&self, timestamp_ms: u64, level: Level, msg: &[u8]) -> bool {
        let mut pos = self.write_idx.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[pos as usize & Self::MASK];
            let seq = slot.seq.load(Ordering::Acquire);
            let lag = seq.wrapping_sub(pos) as i32;

            if lag == 0 {
                match self.write_idx.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the CAS gave this thread exclusive use of
                        // the slot until the stamp below is stored.
                        unsafe {
                            let entry = &mut *slot.entry.get();
                            entry.timestamp_ms = timestamp_ms;
                            entry.level = level;
                            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
                            entry.msg[..entry.len as usize]
                                .copy_from_slice(&msg[..entry.len as usize]);
                        }
                        slot.seq.store(pos.wrapping_add(1), Ordering::Release);
                        return true;
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                // Slot still holds an entry from the previous lap
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                pos = self.write_idx.load(Ordering::Relaxed);
            }
        }
    }

    /// Drain next log entry.
    ///
    /// Returns `None` if no committed entry is available. An entry claimed
    /// but not yet committed holds back everything behind it.
    pub fn drain(&self) -> Option<LogEntry> {
        let mut pos = self.read_idx.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[pos as usize & Self::MASK];
            let seq = slot.seq.load(Ordering::Acquire);
            let lag = seq.wrapping_sub(pos.wrapping_add(1)) as i32;

            if lag == 0 {
                match self.read_idx.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: committed, and no producer reuses the slot
                        // until the stamp below frees it for the next lap.
                        let entry = unsafe { *slot.entry.get() };
                        slot.seq.store(pos.wrapping_add(N as u32), Ordering::Release);
                        return Some(entry);
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                return None;
            } else {
                pos = self.read_idx.load(Ordering::Relaxed);
            }
        }
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take the dropped counter, resetting it.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }

    /// Number of claimed entries not yet drained, including ones still
    /// being written.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer, truncating.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl core::fmt::Write for BufWriter<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Format one entry as a console line.
///
/// Format: `[timestamp_ms] LEVEL: message\n`
pub fn format_entry(out: &mut dyn core::fmt::Write, entry: &LogEntry) -> core::fmt::Result {
    write!(out, "[{:10}] {:5}: {}\n", entry.timestamp_ms, entry.level.as_str(), entry.message())
}

/// `log` backend writing into a `LogStream`
pub struct StreamLogger<const N: usize = LOG_BUFFER_SIZE> {
    stream: LogStream<N>,
    now_ms: fn() -> u64,
}

impl<const N: usize> StreamLogger<N> {
    /// Logger stamping entries with `now_ms`
    pub const fn new(now_ms: fn() -> u64) -> Self {
        Self {
            stream: LogStream::new(),
            now_ms,
        }
    }

    /// Install `logger` as the global `log` backend
    pub fn init(logger: &'static Self, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn stream(&self) -> &LogStream<N> {
        &self.stream
    }

    /// Write every pending entry to `out`, then a line reporting drops.
    ///
    /// Returns the number of entries written.
    pub fn drain_to(&self, out: &mut dyn core::fmt::Write) -> usize {
        let mut count = 0;
        while let Some(entry) = self.stream.drain() {
            let _ = format_entry(out, &entry);
            count += 1;
        }

        let dropped = self.stream.take_dropped();
        if dropped > 0 {
            let _ = write!(
                out,
                "[{:10}] WARN : {} log messages dropped\n",
                (self.now_ms)(),
                dropped
            );
        }
        count
    }
}

impl<const N: usize> Log for StreamLogger<N> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let target = record.target().rsplit("::").next().unwrap_or("");
        let mut buf = [0u8; MAX_MSG_LEN];
        let len = format_to_buffer(&mut buf, format_args!("{}: {}", target, record.args()));
        self.stream.push((self.now_ms)(), record.level(), &buf[..len]);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    fn zero() -> u64 {
        0
    }

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, Level::Info, b"test message"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 1000);
        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.message(), "test message");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, Level::Info, b"1"));
        assert!(stream.push(2, Level::Info, b"2"));
        assert!(stream.push(3, Level::Info, b"3"));
        assert!(stream.push(4, Level::Info, b"4"));

        assert!(!stream.push(5, Level::Info, b"5"));
        assert_eq!(stream.dropped(), 1);
        assert_eq!(stream.pending(), 4);

        stream.drain();
        assert!(stream.push(6, Level::Info, b"6"));
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 8];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 4242));
        assert_eq!(&buf[..len], b"Hello 42");
    }

    #[test]
    fn test_format_entry() {
        let stream = LogStream::<4>::new();
        stream.push(1234, Level::Warn, b"fsm: Idle -> Waiting");
        let entry = stream.drain().unwrap();

        let mut line = String::new();
        format_entry(&mut line, &entry).unwrap();
        assert_eq!(line, "[      1234] WARN : fsm: Idle -> Waiting\n");
    }

    #[test]
    fn test_drain_reports_drops() {
        let logger = StreamLogger::<2>::new(zero);
        logger.stream().push(1, Level::Info, b"a");
        logger.stream().push(2, Level::Info, b"b");
        logger.stream().push(3, Level::Info, b"c");

        let mut out = String::new();
        assert_eq!(logger.drain_to(&mut out), 2);
        assert!(out.contains("INFO : a"));
        assert!(out.contains("1 log messages dropped"));
        assert_eq!(logger.stream().dropped(), 0);
    }

    #[test]
    fn test_multiple_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("Thread {} msg {}", i, j);
                    stream.push(j as u64, Level::Info, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while stream.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 40);
    }

    #[test]
    fn test_full_ring_leaves_write_index() {
        let stream = LogStream::<4>::new();
        for i in 0..4 {
            assert!(stream.push(i, Level::Info, b"x"));
        }
        assert!(!stream.push(4, Level::Info, b"late"));
        assert_eq!(stream.write_idx.load(Ordering::Relaxed), 4);

        stream.drain();
        stream.drain();
        assert!(stream.push(5, Level::Info, b"after"));

        let stamps: Vec<u64> = core::iter::from_fn(|| stream.drain())
            .map(|e| e.timestamp_ms)
            .collect();
        assert_eq!(stamps, [2, 3, 5]);
    }

    #[test]
    fn test_uncommitted_slot_is_not_drained() {
        let stream = LogStream::<4>::new();

        // A producer has claimed position 0 but not finished writing
        stream.write_idx.store(1, Ordering::Relaxed);
        assert!(stream.push(7, Level::Info, b"second"));
        assert!(stream.drain().is_none());
        assert_eq!(stream.pending(), 2);

        unsafe { (*stream.slots[0].entry.get()).timestamp_ms = 6 };
        stream.slots[0].seq.store(1, Ordering::Release);

        assert_eq!(stream.drain().map(|e| e.timestamp_ms), Some(6));
        assert_eq!(stream.drain().map(|e| e.message().len()), Some(6));
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_producers_and_drain_run_together() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        use std::thread;

        const PRODUCERS: u64 = 4;
        const PER_PRODUCER: u64 = 5000;

        let stream = Arc::new(LogStream::<4>::new());
        let done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let stream = Arc::clone(&stream);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    match stream.drain() {
                        Some(entry) => seen.push(entry),
                        None if done.load(Ordering::Acquire) => match stream.drain() {
                            Some(entry) => seen.push(entry),
                            None => break,
                        },
                        None => thread::yield_now(),
                    }
                }
                seen
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    let mut accepted = 0u64;
                    for i in 0..PER_PRODUCER {
                        let msg = format!("{}:{}", p, i);
                        if stream.push(p * PER_PRODUCER + i, Level::Info, msg.as_bytes()) {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        let accepted: u64 = producers.into_iter().map(|h| h.join().unwrap()).sum();
        done.store(true, Ordering::Release);
        let seen = consumer.join().unwrap();

        assert_eq!(seen.len() as u64, accepted);
        assert_eq!(accepted + u64::from(stream.dropped()), PRODUCERS * PER_PRODUCER);

        // Every entry is whole and each producer's entries arrive in order
        let mut last = [None::<u64>; PRODUCERS as usize];
        for entry in &seen {
            let p = entry.timestamp_ms / PER_PRODUCER;
            let i = entry.timestamp_ms % PER_PRODUCER;
            assert_eq!(entry.message(), format!("{}:{}", p, i));
            let prev = &mut last[p as usize];
            assert!(prev.map_or(true, |prev| prev < i));
            *prev = Some(i);
        }
    }
}
