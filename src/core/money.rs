use rust_decimal::Decimal;

/// Parse a ledger currency cell into an exact decimal amount.
///
/// Tolerates `$` signs, thousands separators and surrounding whitespace.
/// Empty cells parse as zero (spreadsheet exports leave blanks everywhere);
/// anything else unparsable returns `None`.
///
/// # Examples
///
/// ```
/// use payout_engine::core::money::parse_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_amount("-$1,234.56"), Some(dec!(-1234.56)));
/// assert_eq!(parse_amount(""), Some(dec!(0)));
/// assert_eq!(parse_amount("n/a"), None);
/// ```
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    cleaned.parse().ok()
}

/// Parse a currency cell, recovering from garbage by substituting zero.
///
/// Unparsable values are a data-entry problem, not a reason to abort the
/// run; they are logged and treated as zero.
pub fn parse_amount_lenient(raw: &str) -> Decimal {
    match parse_amount(raw) {
        Some(amount) => amount,
        None => {
            log::warn!("unparsable currency value {raw:?}, treating as zero");
            Decimal::ZERO
        }
    }
}

/// Format an amount with exactly two decimal places, e.g. `"12.50"`.
///
/// Rounds to the cent first (banker's rounding, matching decimal
/// quantization) so `{:.2}` never truncates a live digit.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
