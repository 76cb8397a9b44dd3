//! Field-level checks shared by the entity modules and the service layer.
//!
//! Each check reports the offending field so callers can build per-field messages.
use rust_decimal::Decimal;

use crate::errors::ModelError;

pub fn required(field: &'static str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::invalid(field, "is required"));
    }
    max_len(field, value, max)
}

pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(ModelError::invalid(field, format!("must be at most {max} characters")));
    }
    Ok(())
}

pub fn optional_max_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ModelError> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

pub fn email(field: &'static str, value: &str) -> Result<(), ModelError> {
    let trimmed = value.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ModelError::invalid(field, "must be a valid email address"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ModelError::invalid(field, "must be a valid email address"));
    }
    Ok(())
}

pub fn non_negative(field: &'static str, value: Decimal) -> Result<(), ModelError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ModelError::invalid(field, "must be at least 0"));
    }
    Ok(())
}

pub fn positive(field: &'static str, value: Decimal) -> Result<(), ModelError> {
    if value <= Decimal::ZERO {
        return Err(ModelError::invalid(field, "must be greater than 0"));
    }
    Ok(())
}

/// Largest value a `NUMERIC(10,2)` money column holds.
pub const MONEY_MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// A money amount that fits its column once rounded to cents.
pub fn money(field: &'static str, value: Decimal) -> Result<(), ModelError> {
    non_negative(field, value)?;
    fits_money(field, value.round_dp(2))
}

/// Upper bound only; for derived figures such as balances.
pub fn fits_money(field: &'static str, value: Decimal) -> Result<(), ModelError> {
    if value > MONEY_MAX {
        return Err(ModelError::invalid(field, format!("must be at most {MONEY_MAX}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn required_rejects_blank_and_long_values() {
        assert!(required("name", "  ", 10).is_err());
        assert!(required("name", "abcdefghijk", 10).is_err());
        assert!(required("name", "Ana", 10).is_ok());
    }

    #[test]
    fn max_len_counts_characters_not_bytes() {
        assert!(max_len("name", "ñññ", 3).is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "ana@studio.pe").is_ok());
        assert!(email("email", "ana.studio.pe").is_err());
        assert!(email("email", "ana@studio").is_err());
        assert!(email("email", "@studio.pe").is_err());
    }

    #[test]
    fn money_bounds() {
        assert!(non_negative("price", dec!(0)).is_ok());
        assert!(non_negative("price", dec!(-0.01)).is_err());
        assert!(positive("amount", dec!(0)).is_err());
        assert!(positive("amount", dec!(0.01)).is_ok());
    }

    #[test]
    fn money_fits_numeric_10_2() {
        assert_eq!(MONEY_MAX, dec!(99999999.99));
        assert!(money("price", dec!(99999999.99)).is_ok());
        assert!(money("price", dec!(99999999.994)).is_ok());
        assert!(money("price", dec!(99999999.995)).is_err());
        assert!(money("price", dec!(100000000.00)).is_err());
        assert!(money("price", dec!(1000000000)).is_err());
        assert!(money("price", dec!(-1)).is_err());
        let err = money("total_price", dec!(1e9)).unwrap_err();
        assert_eq!(err.to_string(), "total_price: must be at most 99999999.99");
    }

    #[test]
    fn error_names_the_field() {
        let err = positive("amount", dec!(-1)).unwrap_err();
        assert_eq!(err.to_string(), "amount: must be greater than 0");
    }
}
