use crate::domain::money::Money;
use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fee policy applied when a transaction is initiated.
pub trait FeeCalculator: Send + Sync {
    fn calculate_fee(&self, amount: &Money) -> Result<Money>;
}

/// Percentage fee with a hard cap: `fee = min(amount * rate, cap)`.
///
/// The cap is denominated in the amount's own currency unit.
#[derive(Debug, Clone)]
pub struct StandardFeeCalculator {
    rate: Decimal,
    cap: Decimal,
}

impl StandardFeeCalculator {
    pub fn new(rate: Decimal, cap: Decimal) -> Self {
        Self { rate, cap }
    }
}

impl Default for StandardFeeCalculator {
    /// 1.5% capped at 200.00 per currency unit.
    fn default() -> Self {
        Self::new(dec!(0.015), dec!(200.00))
    }
}

impl FeeCalculator for StandardFeeCalculator {
    fn calculate_fee(&self, amount: &Money) -> Result<Money> {
        let computed = amount.multiply(self.rate)?;
        let cap = Money::new(self.cap, amount.currency())?;
        if computed.is_greater_than(&cap)? {
            Ok(cap)
        } else {
            Ok(computed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;

    #[test]
    fn test_percentage_below_cap() {
        let calc = StandardFeeCalculator::default();
        let amount = Money::new(dec!(100.00), Currency::Ngn).unwrap();
        let fee = calc.calculate_fee(&amount).unwrap();
        assert_eq!(fee.amount(), dec!(1.50000));
    }

    #[test]
    fn test_cap_applies_to_large_amounts() {
        let calc = StandardFeeCalculator::default();
        // 1.5% of 1,000,000 is 15,000 which exceeds the 200 cap.
        let amount = Money::new(dec!(1000000), Currency::Usd).unwrap();
        let fee = calc.calculate_fee(&amount).unwrap();
        assert_eq!(fee.amount(), dec!(200.00));
        assert_eq!(fee.currency(), Currency::Usd);
    }

    #[test]
    fn test_zero_amount_zero_fee() {
        let calc = StandardFeeCalculator::default();
        let fee = calc.calculate_fee(&Money::zero(Currency::Eur)).unwrap();
        assert_eq!(fee.amount(), Decimal::ZERO);
    }
}
