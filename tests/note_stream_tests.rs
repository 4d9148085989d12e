//! Note stream format tests

use rust_onair_desklight::audio::notes::{decode, encode, total_duration_ms, RECORD_LEN};
use rust_onair_desklight::audio::{NoteEvent, ONAIR_TUNE};

#[test]
fn test_decode_is_lossless_and_ordered() {
    // Every byte value in every field position
    let bytes: Vec<u8> = (0..=255u8).collect();
    let notes: Vec<NoteEvent> = decode(&bytes).collect();

    assert_eq!(notes.len(), 64);
    for (i, note) in notes.iter().enumerate() {
        let b = &bytes[i * RECORD_LEN..(i + 1) * RECORD_LEN];
        assert_eq!(note.frequency_hz, u16::from_le_bytes([b[0], b[1]]));
        assert_eq!(note.duration_ms, u16::from_le_bytes([b[2], b[3]]));
    }
}

#[test]
fn test_truncated_tail_is_dropped() {
    let mut bytes = encode(&[NoteEvent::new(440, 250), NoteEvent::rest(100)]);
    for extra in 1..RECORD_LEN {
        bytes.push(0xAA);
        let stream = decode(&bytes);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.trailing().len(), extra);
        assert_eq!(stream.count(), 2);
    }
}

#[test]
fn test_empty_stream() {
    assert_eq!(decode(&[]).count(), 0);
    assert_eq!(decode(&[1, 2, 3]).count(), 0);
    assert_eq!(total_duration_ms(&[]), 0);
}

#[test]
fn test_encode_decode_round_trip() {
    let tune = vec![
        NoteEvent::new(262, 400),
        NoteEvent::rest(20),
        NoteEvent::new(u16::MAX, u16::MAX),
        NoteEvent::new(1, 0),
    ];
    let bytes = encode(&tune);
    assert_eq!(bytes.len(), tune.len() * RECORD_LEN);
    assert_eq!(decode(&bytes).collect::<Vec<_>>(), tune);
}

#[test]
fn test_onboard_tune() {
    assert_eq!(ONAIR_TUNE.len() % RECORD_LEN, 0);

    let notes: Vec<NoteEvent> = decode(ONAIR_TUNE).collect();
    assert!(!notes.is_empty());
    assert!(!notes[0].is_rest());
    assert!(notes.iter().all(|n| n.duration_ms > 0));
    assert!(notes.iter().filter(|n| !n.is_rest()).all(|n| (100..=5000).contains(&n.frequency_hz)));

    // Short enough that the radio is not off for long
    assert!(total_duration_ms(ONAIR_TUNE) < 10_000);
}
