use std::fmt;

/// Money is tracked in whole dollars; Monopoly cash has no coins.
pub type Dollars = i64;

/// Bill sizes offered for staging a transfer amount.
pub const DENOMINATIONS: [Dollars; 7] = [1, 5, 10, 20, 50, 100, 500];

/// Format dollars as a US currency string without fraction digits.
/// Example: 1500 -> "$1,500", -1200 -> "-$1,200"
pub fn format_dollars(amount: Dollars) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}", sign, grouped)
}

/// Parse a user-typed amount into whole dollars.
/// Accepts "200", "$1,500" and "200.00"; anything with real cents is rejected.
pub fn parse_amount(input: &str) -> Result<Dollars, ParseAmountError> {
    let input = input.trim();
    let input = input.strip_prefix('$').unwrap_or(input);
    let cleaned: String = input.chars().filter(|ch| *ch != ',').collect();

    if cleaned.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let (units, fraction) = match cleaned.split_once('.') {
        Some((units, fraction)) => (units, Some(fraction)),
        None => (cleaned.as_str(), None),
    };

    if let Some(fraction) = fraction {
        if !fraction.chars().all(|ch| ch == '0') {
            return Err(ParseAmountError::Fractional);
        }
    }

    if units.is_empty() || !units.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    units.parse().map_err(|_| ParseAmountError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
    Fractional,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::InvalidFormat => write!(f, "invalid amount format"),
            ParseAmountError::Fractional => write!(f, "amounts must be whole dollars"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(0), "$0");
        assert_eq!(format_dollars(5), "$5");
        assert_eq!(format_dollars(999), "$999");
        assert_eq!(format_dollars(1500), "$1,500");
        assert_eq!(format_dollars(1_234_567), "$1,234,567");
        assert_eq!(format_dollars(-1200), "-$1,200");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("200"), Ok(200));
        assert_eq!(parse_amount("  50 "), Ok(50));
        assert_eq!(parse_amount("$1,500"), Ok(1500));
        assert_eq!(parse_amount("200.00"), Ok(200));
        assert_eq!(parse_amount("0"), Ok(0));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("$"), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("12.5"), Err(ParseAmountError::Fractional));
        assert_eq!(parse_amount("-20"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("abc"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount(".00"), Err(ParseAmountError::InvalidFormat));
    }
}
