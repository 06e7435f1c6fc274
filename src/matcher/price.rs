use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const CURRENCY_SYMBOL: &str = "R$";

/// Parses a Brazilian-formatted price such as `R$ 1.234,56`.
///
/// The currency symbol is dropped, `.` is treated as a thousands separator
/// and `,` as the decimal separator. Text that still does not parse yields
/// zero rather than an error.
pub fn parse_price(text: &str) -> Decimal {
    let cleaned = text
        .to_uppercase()
        .replace(CURRENCY_SYMBOL, "")
        .replace('.', "")
        .replace(',', ".");
    let cleaned = cleaned.trim();

    Decimal::from_str(cleaned).unwrap_or_else(|_| {
        debug!("Unparseable price text {:?}, defaulting to 0", text);
        Decimal::ZERO
    })
}
