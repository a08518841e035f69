use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Currencies supported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ngn,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// ISO-style currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    /// Parses a currency code, case-insensitively.
    pub fn from_code(code: &str) -> Result<Self> {
        match code.to_ascii_uppercase().as_str() {
            "NGN" => Ok(Currency::Ngn),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(PaymentError::InvalidCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A non-negative amount in a single currency.
///
/// All binary operations require matching currencies. Arithmetic is exact
/// decimal arithmetic; floats never enter the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(PaymentError::Validation(format!(
                "Amount cannot be negative: {amount}"
            )));
        }
        Ok(Self { amount, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn add(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other, "add")?;
        Money::new(self.amount + other.amount, self.currency)
    }

    /// Fails if `other` exceeds `self`; a Money can never go negative.
    pub fn subtract(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other, "subtract")?;
        if self.amount < other.amount {
            return Err(PaymentError::Validation(format!(
                "Cannot subtract {} from {}: result would be negative",
                other.amount, self.amount
            )));
        }
        Money::new(self.amount - other.amount, self.currency)
    }

    pub fn multiply(&self, multiplier: Decimal) -> Result<Money> {
        Money::new(self.amount * multiplier, self.currency)
    }

    pub fn compare(&self, other: &Money) -> Result<Ordering> {
        self.require_same_currency(other, "compare")?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn is_greater_than(&self, other: &Money) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    fn require_same_currency(&self, other: &Money, op: &str) -> Result<()> {
        if self.currency != other.currency {
            return Err(PaymentError::Validation(format!(
                "Cannot {op} {} and {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
