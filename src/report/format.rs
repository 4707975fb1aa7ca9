/// Axis and label formatting for prices in rubles.
///
/// `0` for zero, `N mln` for whole millions, `N.N mln` otherwise.
pub fn format_price(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value % 1_000_000.0 == 0.0 {
        format!("{} mln", (value / 1_000_000.0) as i64)
    } else {
        format!("{:.1} mln", value / 1_000_000.0)
    }
}

/// Whole millions, truncated toward zero.
pub fn millions(value: f64) -> i64 {
    (value / 1_000_000.0) as i64
}

/// Whole thousands, truncated toward zero.
pub fn thousands(value: f64) -> i64 {
    (value / 1_000.0) as i64
}

/// Millions with one decimal, or none when the value is a whole million.
pub fn compact_millions(value: f64) -> String {
    let m = value / 1_000_000.0;
    if m.fract() == 0.0 {
        format!("{}", m as i64)
    } else {
        format!("{m:.1}")
    }
}

/// Rounds to the nearest multiple of 10 000.
pub fn round_to_ten_thousand(value: f64) -> f64 {
    (value / 10_000.0).round() * 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0.0), "0");
        assert_eq!(format_price(12_000_000.0), "12 mln");
        assert_eq!(format_price(12_340_000.0), "12.3 mln");
        assert_eq!(format_price(500_000.0), "0.5 mln");
    }

    #[test]
    fn test_millions_and_thousands_truncate() {
        assert_eq!(millions(12_999_999.0), 12);
        assert_eq!(thousands(254_900.0), 254);
    }

    #[test]
    fn test_compact_millions() {
        assert_eq!(compact_millions(3_000_000.0), "3");
        assert_eq!(compact_millions(3_240_000.0), "3.2");
    }

    #[test]
    fn test_round_to_ten_thousand() {
        assert_eq!(round_to_ten_thousand(254_900.0), 250_000.0);
        assert_eq!(round_to_ten_thousand(256_000.0), 260_000.0);
    }
}
