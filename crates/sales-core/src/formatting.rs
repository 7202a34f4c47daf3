/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;

    // `{:.N}` rounds the exact binary value, ties to even.
    let fixed = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (integer_part, frac_part) = match fixed.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (fixed.as_str(), None),
    };

    let grouped = group_thousands(integer_part);
    let result = match frac_part {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    };

    // "-0" is not a useful display value.
    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a revenue figure in rupees: `₹` prefix, thousands separators, no
/// decimals.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234567.4), "₹ 1,234,567");
/// assert_eq!(format_currency(0.0),       "₹ 0");
/// assert_eq!(format_currency(-950.0),    "₹ -950");
/// ```
pub fn format_currency(amount: f64) -> String {
    format!("₹ {}", format_number(amount, 0))
}

/// Compact magnitude label for chart axes: `950`, `12.5K`, `3.4M`, `1.2B`.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::format_compact;
///
/// assert_eq!(format_compact(950.0), "950");
/// assert_eq!(format_compact(12_500.0), "12.5K");
/// assert_eq!(format_compact(-3_400_000.0), "-3.4M");
/// ```
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{sign}{:.1}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}{:.1}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}{:.1}K", abs / 1e3)
    } else {
        format!("{sign}{:.0}", abs)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
