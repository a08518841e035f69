use crate::domain::events::DomainEvent;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Consecutive failed reservations before a merchant is auto-suspended.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MerchantStatus {
    Active,
    Inactive,
    Suspended,
}

impl MerchantStatus {
    pub fn is_active(&self) -> bool {
        *self == MerchantStatus::Active
    }
}

/// A merchant account snapshot.
///
/// The ledger invariant `0 <= locked_balance <= balance` holds at all times:
/// `reserve` earmarks funds inside the balance, `debit` converts a reservation
/// into a spend by decrementing both fields together, and `release` undoes a
/// reservation. Every mutator returns a new snapshot; nothing here does I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub settlement_account: String,
    pub balance: Decimal,
    pub locked_balance: Decimal,
    pub failed_attempts: u32,
    pub status: MerchantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    /// Creates a new active merchant with no locked funds, emitting a
    /// `MerchantCreated` notification for the caller to dispatch.
    pub fn create(
        business_name: impl Into<String>,
        email: impl Into<String>,
        settlement_account: impl Into<String>,
        balance: Decimal,
    ) -> Result<(Merchant, DomainEvent)> {
        let email = email.into();
        validate_email(&email)?;
        if balance < Decimal::ZERO {
            return Err(PaymentError::Validation(
                "Opening balance cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let merchant = Merchant {
            id: Uuid::new_v4(),
            business_name: business_name.into(),
            email,
            settlement_account: settlement_account.into(),
            balance,
            locked_balance: Decimal::ZERO,
            failed_attempts: 0,
            status: MerchantStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let event = DomainEvent::MerchantCreated {
            merchant_id: merchant.id,
            business_name: merchant.business_name.clone(),
            email: merchant.email.clone(),
            status: merchant.status,
            occurred_at: now,
        };
        Ok((merchant, event))
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Funds not currently earmarked by a reservation.
    pub fn available_balance(&self) -> Decimal {
        self.balance - self.locked_balance
    }

    pub fn has_exceeded_failed_attempts(&self) -> bool {
        self.failed_attempts >= MAX_FAILED_ATTEMPTS
    }

    /// Earmarks `amount` against the available balance. This is the admission
    /// gate for starting a transfer.
    pub fn reserve(&self, amount: Decimal) -> Result<Merchant> {
        require_positive(amount)?;
        if amount > self.available_balance() {
            return Err(PaymentError::InsufficientFunds(self.id));
        }
        Ok(Merchant {
            locked_balance: self.locked_balance + amount,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Undoes a reservation that will not be debited.
    pub fn release(&self, amount: Decimal) -> Result<Merchant> {
        require_positive(amount)?;
        if self.locked_balance < amount {
            return Err(PaymentError::State(format!(
                "Cannot release {amount}: only {} locked",
                self.locked_balance
            )));
        }
        Ok(Merchant {
            locked_balance: self.locked_balance - amount,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Converts a reservation into an actual spend. Decrements balance and
    /// locked balance together, so `locked_balance <= balance` is preserved.
    pub fn debit(&self, amount: Decimal) -> Result<Merchant> {
        require_positive(amount)?;
        if self.locked_balance < amount {
            return Err(PaymentError::State(format!(
                "Cannot debit {amount}: only {} locked",
                self.locked_balance
            )));
        }
        Ok(Merchant {
            balance: self.balance - amount,
            locked_balance: self.locked_balance - amount,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Bumps the failed-reservation counter. Reaching the threshold suspends
    /// the merchant in the same call, acting as a circuit breaker against
    /// repeated failed reservations.
    pub fn increment_failed_attempts(&self) -> Merchant {
        let attempts = self.failed_attempts + 1;
        let status = if attempts >= MAX_FAILED_ATTEMPTS {
            MerchantStatus::Suspended
        } else {
            self.status
        };
        Merchant {
            failed_attempts: attempts,
            status,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn reset_failed_attempts(&self) -> Merchant {
        Merchant {
            failed_attempts: 0,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Reactivates a suspended merchant. Legal only from `Suspended`.
    pub fn activate(&self) -> Result<Merchant> {
        if self.status != MerchantStatus::Suspended {
            return Err(PaymentError::State(
                "Only suspended merchants can be activated".to_string(),
            ));
        }
        Ok(Merchant {
            status: MerchantStatus::Active,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::Validation(format!(
            "Amount must be positive: {amount}"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !valid {
        return Err(PaymentError::Validation(format!(
            "Invalid email address: {email}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn merchant_with(balance: Decimal) -> Merchant {
        Merchant::create("Acme Ltd", "ops@acme.test", "0011223344", balance)
            .unwrap()
            .0
    }

    #[test]
    fn test_create_emits_event_and_starts_active() {
        let (merchant, event) = Merchant::create("Acme", "a@b.co", "123", dec!(50)).unwrap();
        assert_eq!(merchant.status, MerchantStatus::Active);
        assert_eq!(merchant.locked_balance, dec!(0));
        assert_eq!(event.kind(), "merchant_created");
    }

    #[test]
    fn test_create_rejects_bad_email() {
        assert!(Merchant::create("Acme", "not-an-email", "123", dec!(0)).is_err());
    }

    #[test]
    fn test_reserve_moves_nothing_out_of_balance() {
        let m = merchant_with(dec!(1000));
        let m = m.reserve(dec!(101.50)).unwrap();
        assert_eq!(m.balance, dec!(1000));
        assert_eq!(m.locked_balance, dec!(101.50));
    }

    #[test]
    fn test_reserve_respects_available_balance() {
        let m = merchant_with(dec!(100)).reserve(dec!(60)).unwrap();
        // 40 available; 41 must fail.
        assert!(matches!(
            m.reserve(dec!(41)),
            Err(PaymentError::InsufficientFunds(_))
        ));
        assert!(m.reserve(dec!(40)).is_ok());
    }

    #[test]
    fn test_reserve_rejects_non_positive() {
        let m = merchant_with(dec!(100));
        assert!(m.reserve(dec!(0)).is_err());
        assert!(m.reserve(dec!(-5)).is_err());
    }

    #[test]
    fn test_debit_consumes_reservation() {
        let m = merchant_with(dec!(1000)).reserve(dec!(101.50)).unwrap();
        let m = m.debit(dec!(101.50)).unwrap();
        assert_eq!(m.balance, dec!(898.50));
        assert_eq!(m.locked_balance, dec!(0));
    }

    #[test]
    fn test_debit_requires_locked_funds() {
        let m = merchant_with(dec!(1000));
        assert!(m.debit(dec!(1)).is_err());
    }

    #[test]
    fn test_release_returns_funds_to_available() {
        let m = merchant_with(dec!(500)).reserve(dec!(200)).unwrap();
        let m = m.release(dec!(200)).unwrap();
        assert_eq!(m.balance, dec!(500));
        assert_eq!(m.locked_balance, dec!(0));
        assert!(m.release(dec!(1)).is_err());
    }

    #[test]
    fn test_failed_attempts_threshold_suspends() {
        let mut m = merchant_with(dec!(10));
        for _ in 0..4 {
            m = m.increment_failed_attempts();
            assert_eq!(m.status, MerchantStatus::Active);
        }
        m = m.increment_failed_attempts();
        assert_eq!(m.failed_attempts, 5);
        assert_eq!(m.status, MerchantStatus::Suspended);
        assert!(m.has_exceeded_failed_attempts());
    }

    #[test]
    fn test_activate_only_from_suspended() {
        let m = merchant_with(dec!(10));
        assert!(m.activate().is_err());

        let mut suspended = m;
        for _ in 0..5 {
            suspended = suspended.increment_failed_attempts();
        }
        let reactivated = suspended.activate().unwrap();
        assert_eq!(reactivated.status, MerchantStatus::Active);
    }

    #[test]
    fn test_reset_failed_attempts() {
        let m = merchant_with(dec!(10)).increment_failed_attempts();
        assert_eq!(m.failed_attempts, 1);
        assert_eq!(m.reset_failed_attempts().failed_attempts, 0);
    }
}
