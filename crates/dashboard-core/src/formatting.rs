//! Number formatting helpers shared by the terminal dashboard and the JSON
//! report writer.

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints such as
    // 1.005 round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let grouped = group_thousands(&integer_part.to_string());

    let body = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    // Values that round to zero never carry a sign.
    if negative && rounded != 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a monetary measure (revenue or profit) with two decimals.
///
/// ```
/// use dashboard_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.5), "1,234.50");
/// assert_eq!(format_amount(-20.0), "-20.00");
/// ```
pub fn format_amount(amount: f64) -> String {
    format_number(amount, 2)
}

/// Format a unit count with thousands separators.
pub fn format_quantity(quantity: u64) -> String {
    group_thousands(&quantity.to_string())
}

/// Format a percentage value with two decimals and a `%` suffix.
///
/// ```
/// use dashboard_core::formatting::format_percent;
///
/// assert_eq!(format_percent(50.0), "50.00%");
/// assert_eq!(format_percent(-12.5), "-12.50%");
/// ```
pub fn format_percent(pct: f64) -> String {
    format!("{}%", format_number(pct, 2))
}

/// Render an optional percentage, using `n/a` when it is undefined.
pub fn format_optional_percent(pct: Option<f64>) -> String {
    pct.map(format_percent).unwrap_or_else(|| "n/a".to_string())
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let remainder = s.len() % 3;
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_drops_sign() {
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_number_rounds_midpoint_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500.0), "1,500.00");
        assert_eq!(format_amount(-42.125), "-42.13");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(0), "0");
        assert_eq!(format_quantity(15), "15");
        assert_eq!(format_quantity(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(50.0), "50.00%");
        assert_eq!(format_percent(100.0), "100.00%");
    }

    #[test]
    fn test_format_optional_percent() {
        assert_eq!(format_optional_percent(Some(12.5)), "12.50%");
        assert_eq!(format_optional_percent(None), "n/a");
    }
}
