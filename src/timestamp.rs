//! ISO-8601 UTC timestamps
//!
//! Parses the `YYYY-MM-DDTHH:MM:SS[.sss]Z` strings the live-status API
//! returns into Unix seconds. Fractional seconds are ignored.

/// Timestamp parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    /// Shorter than `YYYY-MM-DDTHH:MM:SS`
    TooShort,
    /// Separator or digit in the wrong place
    Malformed,
    /// A field is outside its calendar range
    OutOfRange,
}

impl core::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooShort => write!(f, "timestamp too short"),
            Self::Malformed => write!(f, "malformed timestamp"),
            Self::OutOfRange => write!(f, "timestamp field out of range"),
        }
    }
}

/// Parse a UTC timestamp into seconds since the Unix epoch
pub fn parse_utc(s: &str) -> Result<i64, TimestampError> {
    let b = s.as_bytes();
    if b.len() < 19 {
        return Err(TimestampError::TooShort);
    }
    if b[4] != b'-'
        || b[7] != b'-'
        || !matches!(b[10], b'T' | b't' | b' ')
        || b[13] != b':'
        || b[16] != b':'
    {
        return Err(TimestampError::Malformed);
    }

    let year = digits(&b[0..4])?;
    let month = digits(&b[5..7])?;
    let day = digits(&b[8..10])?;
    let hour = digits(&b[11..13])?;
    let minute = digits(&b[14..16])?;
    let second = digits(&b[17..19])?;

    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return Err(TimestampError::OutOfRange);
    }
    if hour > 23 || minute > 59 || second > 60 {
        return Err(TimestampError::OutOfRange);
    }

    let days = days_from_civil(year, month, day);
    Ok(days * 86_400 + hour * 3_600 + minute * 60 + second)
}

fn digits(field: &[u8]) -> Result<i64, TimestampError> {
    field.iter().try_fold(0i64, |acc, &c| {
        if c.is_ascii_digit() {
            Ok(acc * 10 + i64::from(c - b'0'))
        } else {
            Err(TimestampError::Malformed)
        }
    })
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(parse_utc("1970-01-01T00:00:00.000Z"), Ok(0));
    }

    #[test]
    fn test_known_dates() {
        assert_eq!(parse_utc("2000-03-01T00:00:00Z"), Ok(951_868_800));
        assert_eq!(parse_utc("2024-02-29T12:00:00.000Z"), Ok(1_709_208_000));
        assert_eq!(parse_utc("2025-10-19T11:30:00.000Z"), Ok(1_760_873_400));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_utc("2025-10-19"), Err(TimestampError::TooShort));
        assert_eq!(parse_utc("2025/10/19T11:30:00Z"), Err(TimestampError::Malformed));
        assert_eq!(parse_utc("2025-1x-19T11:30:00Z"), Err(TimestampError::Malformed));
        assert_eq!(parse_utc("2025-02-30T11:30:00Z"), Err(TimestampError::OutOfRange));
        assert_eq!(parse_utc("2025-10-19T24:00:00Z"), Err(TimestampError::OutOfRange));
    }
}
