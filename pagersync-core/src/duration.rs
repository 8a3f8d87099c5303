//! Parser for Go-style duration strings such as `2400h`, `1h30m` or `500ms`.
//!
//! `PAGERDUTY_SCHEDULE_LOOKAHEAD` has always been written in this format, so
//! existing deployments keep working unchanged.

use std::time::Duration;

use crate::error::ConfigError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a duration made of `<number><unit>` components.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. Numbers may carry a
/// decimal fraction (`1.5h`). A bare `0` is accepted. Negative durations are
/// rejected since a lookahead window cannot point into the past.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let malformed = |reason: &str| ConfigError::MalformedDuration {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = raw.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(malformed("negative durations are not supported"));
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(malformed("empty duration"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed("expected a number"));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            "" => return Err(malformed("missing unit")),
            _ => return Err(malformed("unknown unit")),
        };
        rest = &rest[unit_len..];

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| malformed("number out of range"))?
        };
        let mut value = whole
            .checked_mul(unit)
            .ok_or_else(|| malformed("duration out of range"))?;

        if !frac_part.is_empty() {
            // Only as many fraction digits as can still change the result.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| malformed("invalid fraction"))?;
            let scale = 10u128.pow(digits.len() as u32);
            value += numerator * unit / scale;
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| malformed("duration out of range"))?;
    }

    let nanos = u64::try_from(total).map_err(|_| malformed("duration out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2400h", Duration::from_secs(2_400 * 3_600))]
    #[case("1h30m", Duration::from_secs(5_400))]
    #[case("45s", Duration::from_secs(45))]
    #[case("500ms", Duration::from_millis(500))]
    #[case("1.5h", Duration::from_secs(5_400))]
    #[case("+10m", Duration::from_secs(600))]
    #[case("0", Duration::ZERO)]
    #[case("2us", Duration::from_micros(2))]
    fn parses_go_style_durations(#[case] raw: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(raw).expect("parse"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("10")]
    #[case("10d")]
    #[case("h")]
    #[case("-1h")]
    #[case("one hour")]
    fn rejects_malformed_durations(#[case] raw: &str) {
        let err = parse_duration(raw).unwrap_err();
        assert!(
            matches!(err, ConfigError::MalformedDuration { .. }),
            "got: {err}"
        );
        assert!(err.to_string().contains(raw));
    }
}
