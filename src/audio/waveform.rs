//! Quantized sine lookup table for the SPWM tone channels
//!
//! 32-entry table covering one full cycle.
//! Values are 7-bit duty levels (0-127) for direct use with the LEDC
//! duty register at 7-bit resolution.

/// Number of entries in the sine table (also the oversampling factor)
pub const TABLE_LEN: usize = 32;

/// Mask applied to the cursor after each advance
pub const CURSOR_MASK: u8 = (TABLE_LEN - 1) as u8;

/// Largest value stored in the table
pub const PEAK: u8 = 127;

/// Pre-computed sine table
///
/// 32 samples covering 0 to 2π, offset to the unsigned range.
/// Index 0 = midpoint (64), 8 = crest (127), 16 = midpoint, 24 = trough (0)
pub static SINE_TABLE: [u8; TABLE_LEN] = [
    64, 76, 88, 99, 108, 116, 122, 126, 127, 126, 122, 116, 108, 99, 88, 76,
    64, 51, 39, 28, 19, 11, 5, 1, 0, 1, 5, 11, 19, 28, 39, 51,
];

/// Cursor position following `index`
#[inline]
pub const fn next_index(index: u8) -> u8 {
    index.wrapping_add(1) & CURSOR_MASK
}
