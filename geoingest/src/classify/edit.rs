//! Saisie manuelle d'une plage de classe ("lo - hi")

use std::sync::LazyLock;

use regex::Regex;

use crate::GeoIngestError;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*-\s*(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*$")
        .expect("range pattern is valid")
});

/// Parse exactement deux nombres séparés par un tiret (tirets demi-cadratin,
/// cadratin et signe moins ramenés au trait d'union). La borne basse ne doit
/// pas dépasser la borne haute.
pub fn parse_break_range(input: &str) -> Result<(f64, f64), GeoIngestError> {
    let normalized: String = input
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    let invalid = || GeoIngestError::InvalidBreakRange(input.to_string());
    let caps = RANGE_RE.captures(&normalized).ok_or_else(invalid)?;

    let lo: f64 = caps[1].parse().map_err(|_| invalid())?;
    let hi: f64 = caps[2].parse().map_err(|_| invalid())?;
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(invalid());
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_range() {
        assert_eq!(parse_break_range("10 - 20").unwrap(), (10.0, 20.0));
        assert_eq!(parse_break_range("1.5-2.25").unwrap(), (1.5, 2.25));
    }

    #[test]
    fn test_dash_variants_and_negatives() {
        assert_eq!(parse_break_range("10 \u{2013} 20").unwrap(), (10.0, 20.0));
        assert_eq!(parse_break_range("10\u{2014}20").unwrap(), (10.0, 20.0));
        assert_eq!(parse_break_range("-10 - -5").unwrap(), (-10.0, -5.0));
        assert_eq!(parse_break_range("-10--5").unwrap(), (-10.0, -5.0));
    }

    #[test]
    fn test_invalid_input() {
        for input in ["", "10", "10 - ", "a - b", "1 - 2 - 3", "20 - 10", "10 to 20"] {
            assert!(
                matches!(parse_break_range(input), Err(GeoIngestError::InvalidBreakRange(_))),
                "{input:?}"
            );
        }
    }
}
