// Human-scaled number formatting for chart values

/// Default number of decimal places when a series has no configured resolution.
pub const DEFAULT_RESOLUTION: usize = 2;

/// Highest resolution a series can be configured with.
pub const MAX_RESOLUTION: usize = 3;

/// Power-of-1000 tiers and their suffixes.
const TIER_SUFFIXES: [(i32, &str); 9] = [
    (-4, "p"),
    (-3, "n"),
    (-2, "μ"),
    (-1, "m"),
    (0, ""),
    (1, "K"),
    (2, "M"),
    (3, "B"),
    (4, "T"),
];

/// Format a raw value with an SI-like suffix at `resolution` decimal places.
///
/// Values whose magnitude falls outside the suffix table are rendered in
/// exponential notation instead. Zero is always `0.` followed by `resolution`
/// zeros.
pub fn format_value(value: f64, resolution: usize) -> String {
    if value == 0.0 {
        return format!("0.{}", "0".repeat(resolution));
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    let tier = (magnitude.log10() / 3.0).floor();

    match suffix_for(tier) {
        Some((tier, suffix)) => {
            let scaled = magnitude / 10f64.powi(tier * 3);
            format!("{sign}{scaled:.resolution$}{suffix}")
        }
        None => exponential(value, resolution),
    }
}

fn suffix_for(tier: f64) -> Option<(i32, &'static str)> {
    if !tier.is_finite() {
        return None;
    }
    TIER_SUFFIXES
        .iter()
        .find(|(t, _)| f64::from(*t) == tier)
        .copied()
}

/// Exponential notation with an explicitly signed exponent, e.g. `1.50e+15`.
fn exponential(value: f64, resolution: usize) -> String {
    let formatted = format!("{value:.resolution$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_padded_to_resolution() {
        assert_eq!(format_value(0.0, 0), "0.");
        assert_eq!(format_value(0.0, 1), "0.0");
        assert_eq!(format_value(0.0, 2), "0.00");
        assert_eq!(format_value(0.0, 3), "0.000");
    }

    #[test]
    fn test_thousands_round_to_resolution() {
        assert_eq!(format_value(1500.0, 0), "2K");
        assert_eq!(format_value(1500.0, 1), "1.5K");
    }

    #[test]
    fn test_negative_values_keep_sign() {
        assert_eq!(format_value(-2_500_000.0, 2), "-2.50M");
        assert_eq!(format_value(-0.25, 1), "-250.0m");
    }

    #[test]
    fn test_unit_tier_has_no_suffix() {
        assert_eq!(format_value(42.0, 2), "42.00");
        assert_eq!(format_value(1.0, 0), "1");
    }

    #[test]
    fn test_small_and_large_tiers() {
        assert_eq!(format_value(0.0000035, 2), "3.50μ");
        assert_eq!(format_value(7.0e12, 1), "7.0T");
        assert_eq!(format_value(3.0e9, 0), "3B");
    }

    #[test]
    fn test_out_of_table_falls_back_to_exponential() {
        assert_eq!(format_value(1.5e-13, 2), "1.50e-13");
        assert_eq!(format_value(2.0e15, 2), "2.00e+15");
        assert_eq!(format_value(-2.0e15, 1), "-2.0e+15");
    }

    #[test]
    fn test_non_finite_values_still_format() {
        assert_eq!(format_value(f64::NAN, 2), "NaN");
        assert_eq!(format_value(f64::INFINITY, 2), "inf");
    }
}
