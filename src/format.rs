//! Reply formatting helpers

/// Shown to the user whenever the exchange API fails.
pub const UPSTREAM_APOLOGY: &str =
    "Sorry, I couldn't reach Reya's market data right now. Please try again in a moment.";

pub const NOT_AVAILABLE: &str = "N/A";

/// `$64,250.50`; below `$1` keeps up to six decimals.
pub fn usd(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };

    let sign = if v < 0.0 { "-" } else { "" };
    let abs = v.abs();

    if abs < 1.0 {
        let trimmed = format!("{:.6}", abs);
        let trimmed = trimmed.trim_end_matches('0').trim_end_matches('.');
        return format!("{}${}", sign, trimmed);
    }

    let fixed = format!("{:.2}", abs);
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(whole), frac)
}

/// `$1.25M`, `$980.00K`, `$3.10B`.
pub fn usd_compact(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };

    let abs = v.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (v / 1e9, "B")
    } else if abs >= 1e6 {
        (v / 1e6, "M")
    } else if abs >= 1e3 {
        (v / 1e3, "K")
    } else {
        return usd(Some(v));
    };
    format!("${:.2}{}", scaled, suffix)
}

/// Signed percentage. Input is already in percent units.
pub fn percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:+.2}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd() {
        assert_eq!(usd(Some(64250.5)), "$64,250.50");
        assert_eq!(usd(Some(1_000_000.0)), "$1,000,000.00");
        assert_eq!(usd(Some(0.00042)), "$0.00042");
        assert_eq!(usd(Some(-12.3)), "-$12.30");
        assert_eq!(usd(None), "N/A");
        assert_eq!(usd(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_usd_compact() {
        assert_eq!(usd_compact(Some(1_250_000.0)), "$1.25M");
        assert_eq!(usd_compact(Some(3_100_000_000.0)), "$3.10B");
        assert_eq!(usd_compact(Some(512.0)), "$512.00");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(Some(2.5)), "+2.50%");
        assert_eq!(percent(Some(-0.1234)), "-0.12%");
        assert_eq!(percent(None), "N/A");
    }
}
