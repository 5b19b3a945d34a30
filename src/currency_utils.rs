// src/currency_utils.rs

/// Shown instead of any monetary value while the privacy toggle is on.
pub const MASK_PLACEHOLDER: &str = "••••••";

/// Shown for numeric fields the backing APIs had no data for.
pub const UNKNOWN_PLACEHOLDER: &str = "-";

/// Render a fixed-precision number with `,` thousands separators.
fn with_thousands_separators(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3 + precision + 2);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Format a USD value for display.
///
/// Masking wins over everything else; unknown values render as a
/// placeholder rather than a fake zero.
pub fn format_usd(value: Option<f64>, masked: bool) -> String {
    if masked {
        return MASK_PLACEHOLDER.to_string();
    }
    match value {
        Some(v) if v < 0.0 => format!("-${}", with_thousands_separators(-v, 2)),
        Some(v) => format!("${}", with_thousands_separators(v, 2)),
        None => UNKNOWN_PLACEHOLDER.to_string(),
    }
}

/// Format a native SOL amount for the balance row.
pub fn format_sol(amount: f64, masked: bool) -> String {
    if masked {
        return format!("{} SOL", MASK_PLACEHOLDER);
    }
    format!("{} SOL", with_thousands_separators(amount, 4))
}

/// Format a percentage change: two decimals, explicit `+` for gains.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("+{:.2}%", v),
        Some(v) => format!("{:.2}%", v),
        None => UNKNOWN_PLACEHOLDER.to_string(),
    }
}

/// Format a per-token price. Sub-cent prices get extra precision so meme
/// tokens don't all collapse to $0.00.
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 && v < 0.01 => format!("${:.6}", v),
        Some(v) => format!("${}", with_thousands_separators(v, 2)),
        None => UNKNOWN_PLACEHOLDER.to_string(),
    }
}

/// Format token amounts with smart abbreviations.
pub fn format_token_amount(amount: Option<f64>, symbol: &str) -> String {
    let amount = match amount {
        Some(a) => a,
        None => return format!("{} {}", UNKNOWN_PLACEHOLDER, symbol),
    };

    if amount == 0.0 {
        return format!("0 {}", symbol);
    }
    if amount < 0.000001 {
        return format!("~0 {}", symbol);
    }

    for (threshold, suffix) in [
        (1_000_000_000.0, "B"),
        (1_000_000.0, "M"),
        (1_000.0, "K"),
    ] {
        if amount >= threshold {
            let value = amount / threshold;
            return if value >= 100.0 {
                format!("{}{} {}", value as i64, suffix, symbol) // e.g. "123M BONK"
            } else if value >= 10.0 {
                format!("{:.0}{} {}", value, suffix, symbol)
            } else {
                format!("{:.1}{} {}", value, suffix, symbol)
            };
        }
    }

    if amount >= 100.0 {
        format!("{:.0} {}", amount, symbol) // e.g. "150 USDC"
    } else if amount >= 10.0 {
        format!("{:.1} {}", amount, symbol)
    } else if amount >= 0.01 {
        format!("{:.2} {}", amount, symbol)
    } else if amount >= 0.001 {
        format!("{:.3} {}", amount, symbol)
    } else {
        format!("{:.4} {}", amount, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_formatting() {
        assert_eq!(format_usd(Some(0.0), false), "$0.00");
        assert_eq!(format_usd(Some(1234567.891), false), "$1,234,567.89");
        assert_eq!(format_usd(Some(999.9), false), "$999.90");
        assert_eq!(format_usd(Some(-1500.5), false), "-$1,500.50");
        assert_eq!(format_usd(None, false), "-");
    }

    #[test]
    fn test_masking_ignores_input() {
        assert_eq!(format_usd(Some(123456.78), true), MASK_PLACEHOLDER);
        assert_eq!(format_usd(Some(0.0), true), MASK_PLACEHOLDER);
        assert_eq!(format_usd(None, true), MASK_PLACEHOLDER);
        assert_eq!(format_sol(42.0, true), "•••••• SOL");
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(format_percent(Some(0.0)), "+0.00%");
        assert_eq!(format_percent(Some(-3.456)), "-3.46%");
        assert_eq!(format_percent(Some(12.5)), "+12.50%");
        assert_eq!(format_percent(None), "-");
    }

    #[test]
    fn test_sol_formatting() {
        assert_eq!(format_sol(2.0, false), "2.0000 SOL");
        assert_eq!(format_sol(1234.56789, false), "1,234.5679 SOL");
    }

    #[test]
    fn test_price_precision_tiers() {
        assert_eq!(format_price(Some(142.5)), "$142.50");
        assert_eq!(format_price(Some(0.000023)), "$0.000023");
        assert_eq!(format_price(None), "-");
    }

    #[test]
    fn test_token_amount_abbreviations() {
        assert_eq!(format_token_amount(Some(1_500_000.0), "BONK"), "1.5M BONK");
        assert_eq!(format_token_amount(Some(12_400.0), "JUP"), "12K JUP");
        assert_eq!(format_token_amount(Some(9.53), "JTO"), "9.53 JTO");
        assert_eq!(format_token_amount(Some(0.0), "SOL"), "0 SOL");
        assert_eq!(format_token_amount(None, "SOL"), "- SOL");
    }
}
