// ---------------------------------------------------------------------------
// SI-prefixed number parsing and formatting
// ---------------------------------------------------------------------------

/// SI prefixes from largest to smallest, as used by simulator netlists.
const PREFIXES: [(&str, f64); 10] = [
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("", 1.0),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
];

fn prefix_scale(c: char) -> Option<f64> {
    match c {
        'T' => Some(1e12),
        'G' => Some(1e9),
        'M' => Some(1e6),
        'k' => Some(1e3),
        'm' => Some(1e-3),
        'u' | 'µ' => Some(1e-6),
        'n' => Some(1e-9),
        'p' => Some(1e-12),
        'f' => Some(1e-15),
        _ => None,
    }
}

/// Parse a number that may carry a trailing SI prefix (`"2u"`, `"40k"`).
///
/// Plain and exponent notation (`"100e-6"`) are accepted as well. Returns
/// `None` for anything else, including the empty string.
pub fn parse_si(text: &str) -> Option<f64> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    let last = s.chars().next_back()?;
    let scale = prefix_scale(last)?;
    let mantissa = &s[..s.len() - last.len_utf8()];
    // "inf" / "nan" followed by a prefix is not a number we want to accept
    if mantissa.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    mantissa.trim_end().parse::<f64>().ok().map(|v| v * scale)
}

/// Format a value with the largest SI prefix not exceeding its magnitude.
///
/// ```
/// # use op_explorer::data::units::format_si;
/// assert_eq!(format_si(40_000.0), "40.00k");
/// assert_eq!(format_si(1.44e-3), "1.44m");
/// ```
pub fn format_si(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value == 0.0 {
        return "0.00".to_string();
    }
    let magnitude = value.abs();
    for (unit, scale) in PREFIXES {
        if magnitude >= scale || unit == "f" {
            return format!("{:.2}{unit}", value / scale);
        }
    }
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_plain_and_exponent_notation() {
        assert_eq!(parse_si("0.25"), Some(0.25));
        assert_eq!(parse_si(" -3 "), Some(-3.0));
        assert_relative_eq!(parse_si("100e-6").unwrap(), 1e-4);
    }

    #[test]
    fn parses_si_suffixes() {
        assert_relative_eq!(parse_si("2u").unwrap(), 2e-6);
        assert_relative_eq!(parse_si("40k").unwrap(), 40e3);
        assert_relative_eq!(parse_si("1.44m").unwrap(), 1.44e-3);
        assert_relative_eq!(parse_si("180n").unwrap(), 180e-9);
        assert_relative_eq!(parse_si("5f").unwrap(), 5e-15);
        assert_relative_eq!(parse_si("3G").unwrap(), 3e9);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_si(""), None);
        assert_eq!(parse_si("abc"), None);
        assert_eq!(parse_si("1.2x"), None);
        assert_eq!(parse_si("k"), None);
        assert_eq!(parse_si("nanu"), None);
    }

    #[test]
    fn formats_with_prefix() {
        assert_eq!(format_si(0.0), "0.00");
        assert_eq!(format_si(1.0), "1.00");
        assert_eq!(format_si(2.5e-6), "2.50u");
        assert_eq!(format_si(-3.3e9), "-3.30G");
        assert_eq!(format_si(1e-18), "0.00f");
    }
}
