//! Duration text format.
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a unit suffix: `300ms`, `1.5h`, `8h47m`. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is zero.
//!
//! Formatting picks the canonical form (`0s`, `750ns`, `1.5µs`, `2.25ms`,
//! `1m30.5s`, `8h47m0s`) so that every formatted duration parses back to the
//! same value.

use std::time::Duration;

use crate::error::ParseError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this contribute less than a nanosecond at any unit.
const MAX_FRACTION_DIGITS: usize = 20;

/// Units accepted in a term, with the spelling handed to `humantime` and the
/// unit's length in nanoseconds.
fn unit(unit: &str) -> Option<(&'static str, u128)> {
    match unit {
        "ns" => Some(("ns", 1)),
        "us" | "µs" | "μs" => Some(("us", 1_000)),
        "ms" => Some(("ms", 1_000_000)),
        "s" => Some(("s", NANOS_PER_SEC)),
        "m" => Some(("m", 60 * NANOS_PER_SEC)),
        "h" => Some(("h", 3_600 * NANOS_PER_SEC)),
        _ => None,
    }
}

/// Parse a duration such as `1h15m` or `2.5s`.
///
/// Whole-number terms are summed by `humantime`; fractional parts are added
/// on top. Terms are restricted to the units above with no separators, so
/// `humantime` extras such as `2d` or `1h 30m` are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, ParseError> {
    let err = |reason: &str| ParseError::syntax(s, "duration", reason);

    let mut rest = s;
    if let Some(unsigned) = rest.strip_prefix('+') {
        rest = unsigned;
    } else if rest.starts_with('-') {
        return Err(err("negative durations are not supported"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(err("empty duration"));
    }

    let mut whole_terms = String::new();
    let mut fraction_nanos: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, mut after) = rest.split_at(int_len);

        let mut frac_digits = "";
        if let Some(fraction) = after.strip_prefix('.') {
            let frac_len = fraction
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(fraction.len());
            (frac_digits, after) = fraction.split_at(frac_len);
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(err("expected a number"));
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit_text, tail) = after.split_at(unit_len);
        if unit_text.is_empty() {
            return Err(err("missing unit"));
        }
        let (spelling, scale) =
            unit(unit_text).ok_or_else(|| err(&format!("unknown unit {:?}", unit_text)))?;

        if !int_digits.is_empty() {
            whole_terms.push_str(int_digits);
            whole_terms.push_str(spelling);
        }
        if !frac_digits.is_empty() {
            let kept = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
            let frac: u128 = kept.parse().map_err(|_| err("overflow"))?;
            let denom = 10u128.pow(kept.len() as u32);
            fraction_nanos = fraction_nanos
                .checked_add(frac * scale / denom)
                .ok_or_else(|| err("overflow"))?;
        }
        rest = tail;
    }

    let whole = if whole_terms.is_empty() {
        Duration::ZERO
    } else {
        humantime::parse_duration(&whole_terms).map_err(|e| err(&e.to_string()))?
    };
    let fraction = Duration::new(
        u64::try_from(fraction_nanos / NANOS_PER_SEC).map_err(|_| err("overflow"))?,
        (fraction_nanos % NANOS_PER_SEC) as u32,
    );
    whole.checked_add(fraction).ok_or_else(|| err("overflow"))
}

/// Render a duration in its canonical form.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos, 1_000, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", with_fraction(nanos, 1_000_000, 6));
    }

    let secs = d.as_secs();
    let (hours, minutes, seconds) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);
    let seconds = with_fraction(
        u128::from(seconds) * NANOS_PER_SEC + u128::from(d.subsec_nanos()),
        NANOS_PER_SEC,
        9,
    );

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&seconds);
    out.push('s');
    out
}

fn with_fraction(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = digits);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1_500));
        assert_eq!(parse_duration("8h47m").unwrap(), Duration::from_secs(8 * 3_600 + 47 * 60));
        assert_eq!(parse_duration("2us").unwrap(), Duration::from_micros(2));
        assert_eq!(parse_duration("2µs").unwrap(), Duration::from_micros(2));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("+1h").unwrap(), Duration::from_secs(3_600));
        assert_eq!(parse_duration("1h0.5m").unwrap(), Duration::from_secs(3_630));
        assert_eq!(parse_duration("1.000000001s").unwrap(), Duration::new(1, 1));
    }

    #[test]
    fn test_parse_rejects() {
        for input in [
            "", "5", "-1s", "1x", "h", ".s", "1.5.5s", "2d", "1h 30m", "5min",
            "99999999999999999999999999999999999999999h",
        ] {
            assert!(parse_duration(input).is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_format_canonical() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_micros(2_250)), "2.25ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_millis(90_500)), "1m30.5s");
        assert_eq!(format_duration(Duration::from_secs(8 * 3_600 + 47 * 60)), "8h47m0s");
        assert_eq!(format_duration(Duration::from_secs(3_600)), "1h0m0s");
    }

    #[test]
    fn test_format_then_parse_is_identity() {
        let samples = [
            Duration::from_nanos(1),
            Duration::from_nanos(999_999_999),
            Duration::from_nanos(1_000_000_001),
            Duration::from_millis(12_345),
            Duration::new(86_400 * 365, 123_456_789),
            Duration::new(u64::MAX, 999_999_999),
        ];
        for d in samples {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d, "{}", format_duration(d));
        }
    }
}
