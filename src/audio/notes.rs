//! Binary note stream
//!
//! Flat sequence of 4-byte little-endian records `{u16 freq_hz, u16 duration_ms}`.
//! No header, no checksum, no length prefix; the stream ends where the bytes
//! end. `freq_hz == 0` is a rest. A trailing partial record is ignored.

use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::slice::ChunksExact;

/// Size of one encoded record
pub const RECORD_LEN: usize = 4;

/// One step of a tune
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Tone frequency, 0 = silence
    pub frequency_hz: u16,
    /// How long the step lasts
    pub duration_ms: u16,
}

impl NoteEvent {
    pub const fn new(frequency_hz: u16, duration_ms: u16) -> Self {
        Self { frequency_hz, duration_ms }
    }

    /// Silence lasting `duration_ms`
    pub const fn rest(duration_ms: u16) -> Self {
        Self::new(0, duration_ms)
    }

    #[inline]
    pub fn is_rest(&self) -> bool {
        self.frequency_hz == 0
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self {
            frequency_hz: u16::from_le_bytes([bytes[0], bytes[1]]),
            duration_ms: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    #[inline]
    pub fn to_le_bytes(self) -> [u8; RECORD_LEN] {
        let f = self.frequency_hz.to_le_bytes();
        let d = self.duration_ms.to_le_bytes();
        [f[0], f[1], d[0], d[1]]
    }
}

/// Iterator over the complete records of an encoded stream
#[derive(Debug, Clone)]
pub struct NoteStream<'a> {
    records: ChunksExact<'a, u8>,
}

impl<'a> NoteStream<'a> {
    /// Bytes of a trailing partial record, if any
    pub fn trailing(&self) -> &'a [u8] {
        self.records.remainder()
    }
}

impl Iterator for NoteStream<'_> {
    type Item = NoteEvent;

    #[inline]
    fn next(&mut self) -> Option<NoteEvent> {
        self.records.next().map(|chunk| {
            NoteEvent::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for NoteStream<'_> {}
impl FusedIterator for NoteStream<'_> {}

/// Decode `bytes` into note events, in order
pub fn decode(bytes: &[u8]) -> NoteStream<'_> {
    NoteStream {
        records: bytes.chunks_exact(RECORD_LEN),
    }
}

/// Encode `notes` into the stream format
pub fn encode(notes: &[NoteEvent]) -> Vec<u8> {
    let mut out = Vec::with_capacity(notes.len() * RECORD_LEN);
    for note in notes {
        out.extend_from_slice(&note.to_le_bytes());
    }
    out
}

/// Total playing time of a stream in milliseconds
pub fn total_duration_ms(bytes: &[u8]) -> u32 {
    decode(bytes).map(|n| u32::from(n.duration_ms)).sum()
}
