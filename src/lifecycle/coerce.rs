//! Numeric coercion for form input.
//!
//! Form fields arrive as strings. Input that does not start with a number
//! becomes `0` instead of an error, so "entered zero" and "failed to parse"
//! are indistinguishable in the stored record. Callers that need strict
//! parsing should validate before reaching these functions.

use tracing::debug;

/// Length of the leading `[+-]?digits[.digits][e[+-]digits]` prefix of `s`.
fn float_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start || has_digits {
            has_digits |= j > frac_start;
            i = j;
        }
    }

    if !has_digits {
        return 0;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}

/// Parse a measurement the way a lenient form would: the leading numeric
/// part of the input counts, anything else is `0`.
pub fn parse_measurement_or_zero(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let len = float_prefix_len(trimmed);

    let value = trimmed[..len]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite());

    match value {
        Some(v) => v,
        None => {
            if !input.trim().is_empty() {
                debug!(input, "non-numeric measurement coerced to 0");
            }
            0.0
        }
    }
}

/// Parse a whole count (leading digits only). Negative or non-numeric
/// input is `0`.
pub fn parse_count_or_zero(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: &str = {
        let end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        &unsigned[..end]
    };

    match digits.parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            if !input.trim().is_empty() {
                debug!(input, "non-numeric count coerced to 0");
            }
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_plain_numbers() {
        assert_eq!(parse_measurement_or_zero("17"), 17.0);
        assert_eq!(parse_measurement_or_zero("70.1"), 70.1);
        assert_eq!(parse_measurement_or_zero(".5"), 0.5);
        assert_eq!(parse_measurement_or_zero("-0.4"), -0.4);
        assert_eq!(parse_measurement_or_zero("1e3"), 1000.0);
    }

    #[test]
    fn test_measurement_leading_number_wins() {
        assert_eq!(parse_measurement_or_zero("  290mm"), 290.0);
        assert_eq!(parse_measurement_or_zero("12.5.3"), 12.5);
        assert_eq!(parse_measurement_or_zero("3."), 3.0);
        assert_eq!(parse_measurement_or_zero("2e"), 2.0);
    }

    #[test]
    fn test_measurement_garbage_is_zero() {
        assert_eq!(parse_measurement_or_zero("abc"), 0.0);
        assert_eq!(parse_measurement_or_zero(""), 0.0);
        assert_eq!(parse_measurement_or_zero("."), 0.0);
        assert_eq!(parse_measurement_or_zero("-"), 0.0);
    }

    #[test]
    fn test_count() {
        assert_eq!(parse_count_or_zero("12"), 12);
        assert_eq!(parse_count_or_zero("12.9"), 12);
        assert_eq!(parse_count_or_zero(" 7 blocks"), 7);
        assert_eq!(parse_count_or_zero("abc"), 0);
        assert_eq!(parse_count_or_zero("-3"), 0);
        assert_eq!(parse_count_or_zero(""), 0);
    }
}
