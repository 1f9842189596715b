//! Monetary amounts and Stripe amount formatting
//!
//! Stripe expects amounts as integers in the currency's smallest unit and
//! currency codes in lowercase.

use crate::error::{AppError, AppResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Currencies Stripe charges in whole units
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// Currencies Stripe charges in thousandths
const THREE_DECIMAL_CURRENCIES: &[&str] = &["BHD", "JOD", "KWD", "OMR", "TND"];

/// An amount of money in a given currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
}

impl Money {
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency.to_uppercase())
    }
}

/// Number of minor-unit digits Stripe uses for a currency
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let code = currency.to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        0
    } else if THREE_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// Converts a total into the amount fields of a processor request
pub trait AmountFormatter: Send + Sync {
    fn amount_fields(&self, total: &Money) -> AppResult<BTreeMap<String, String>>;
}

/// Formats amounts the way the Stripe charges API expects them
#[derive(Debug, Clone, Copy, Default)]
pub struct StripeAmountFormatter;

impl StripeAmountFormatter {
    /// Amount in the currency's smallest unit, rounded half away from zero
    pub fn minor_units(total: &Money) -> AppResult<i64> {
        if total.value.is_sign_negative() && !total.value.is_zero() {
            return Err(AppError::problem(format!(
                "Cannot charge a negative amount ({}).",
                total
            )));
        }

        let exponent = minor_unit_exponent(&total.currency);
        total
            .value
            .checked_mul(Decimal::from(10_i64.pow(exponent)))
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|units| units.to_i64())
            .ok_or_else(|| AppError::problem(format!("Amount {} is too large to charge.", total)))
    }
}

impl AmountFormatter for StripeAmountFormatter {
    fn amount_fields(&self, total: &Money) -> AppResult<BTreeMap<String, String>> {
        let currency = total.currency.trim();
        if currency.is_empty() {
            return Err(AppError::problem("Cannot charge an amount without a currency."));
        }

        let mut fields = BTreeMap::new();
        fields.insert("amount".to_string(), Self::minor_units(total)?.to_string());
        fields.insert("currency".to_string(), currency.to_ascii_lowercase());
        Ok(fields)
    }
}
