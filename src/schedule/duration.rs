//! Signed duration strings: `-1h`, `+30m`, `1h30m`, `1.5h`, `500ms`, `0`.

use super::ScheduleParseError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a duration made of one or more `<number><unit>` groups.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Numbers may carry a
/// fractional part. A single leading `+` or `-` applies to the whole value. The
/// bare string `0` is accepted without a unit.
pub fn parse_duration(input: &str) -> Result<chrono::Duration, ScheduleParseError> {
    let invalid = |reason: &str| ScheduleParseError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = input.trim();
    let negative = match rest.as_bytes().first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    if rest == "0" {
        return Ok(chrono::Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_end);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(stripped) => {
                let frac_end = stripped
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(stripped.len());
                stripped.split_at(frac_end)
            }
            None => ("", after),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, remaining) = after.split_at(unit_end);

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3600 * NANOS_PER_SECOND,
            "" => return Err(invalid("missing unit")),
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("value out of range"))?
        };
        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("value out of range"))?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision of the largest unit carry no weight.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits
                .parse()
                .map_err(|_| invalid("value out of range"))?;
            let denominator = 10u128.pow(digits.len() as u32);
            value += numerator * scale / denominator;
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| invalid("value out of range"))?;
        rest = remaining;
    }

    let nanos = i64::try_from(total).map_err(|_| invalid("value out of range"))?;
    let duration = chrono::Duration::nanoseconds(nanos);
    Ok(if negative { -duration } else { duration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("2s").unwrap(), Duration::seconds(2));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("250us").unwrap(), Duration::microseconds(250));
        assert_eq!(parse_duration("250µs").unwrap(), Duration::microseconds(250));
        assert_eq!(parse_duration("10ns").unwrap(), Duration::nanoseconds(10));
    }

    #[test]
    fn test_signs_and_compound_values() {
        assert_eq!(parse_duration("-1h").unwrap(), Duration::hours(-1));
        assert_eq!(parse_duration("+30m").unwrap(), Duration::minutes(30));
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::minutes(90)
        );
        assert_eq!(
            parse_duration("-1h30m15s").unwrap(),
            -(Duration::minutes(90) + Duration::seconds(15))
        );
    }

    #[test]
    fn test_fractional_values() {
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("2.25m").unwrap(), Duration::seconds(135));
    }

    #[test]
    fn test_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("-0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("0s").unwrap(), Duration::zero());
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "-", "15", "1x", "h", "1h-30m", ".s", "1..5s"] {
            assert!(
                parse_duration(input).is_err(),
                "'{input}' should not parse"
            );
        }
    }

    #[test]
    fn test_error_names_the_input() {
        let err = parse_duration("3 fortnights").unwrap_err();
        assert!(err.to_string().contains("3 fortnights"));
    }
}
