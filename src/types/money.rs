use std::str::FromStr;

use rust_decimal::Decimal;

use super::BankError;

// Amounts mirror a numeric(10,2) column: 8 integer digits, 2 fraction digits.
const MAX_FRACTION_DIGITS: u32 = 2;

fn max_magnitude() -> Decimal {
    Decimal::new(100_000_000, 0)
}

fn parse_decimal(raw: &str) -> Result<Decimal, BankError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BankError::InvalidAmount("amount is required".to_string()));
    }
    let value = Decimal::from_str(trimmed)
        .map_err(|_| BankError::InvalidAmount(format!("{trimmed} is not a decimal number")))?;
    if value.scale() > MAX_FRACTION_DIGITS {
        return Err(BankError::InvalidAmount(
            "amount supports at most two decimal places".to_string(),
        ));
    }
    if value.abs() >= max_magnitude() {
        return Err(BankError::InvalidAmount("amount is too large".to_string()));
    }
    Ok(value)
}

/// Parse a transaction amount: a decimal string, strictly positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, BankError> {
    let value = parse_decimal(raw)?;
    if value <= Decimal::ZERO {
        return Err(BankError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

/// Parse a balance: like an amount, but zero is allowed.
pub fn parse_balance(raw: &str) -> Result<Decimal, BankError> {
    let value = parse_decimal(raw)?;
    if value < Decimal::ZERO {
        return Err(BankError::InvalidAmount(
            "balance cannot be negative".to_string(),
        ));
    }
    Ok(value)
}

/// Render with exactly two decimal places, the canonical stored form.
pub fn format_amount(amount: Decimal) -> String {
    let mut canonical = amount;
    canonical.rescale(MAX_FRACTION_DIGITS);
    canonical.to_string()
}
