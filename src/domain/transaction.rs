use crate::domain::events::DomainEvent;
use crate::domain::money::Money;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Initiated,
    Pending,
    Success,
    Failed,
    Settled,
}

impl TransactionStatus {
    /// Legal lifecycle moves. `Failed` and `Settled` are terminal.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match self {
            Initiated => next == Pending || next == Success || next == Failed,
            Pending => next == Success || next == Failed,
            Success => next == Settled,
            Failed | Settled => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebitStatus {
    Pending,
    Debited,
    Failed,
}

/// A single payment through its lifecycle:
/// `Initiated -> Pending -> {Success, Failed}`, `Success -> Settled`.
///
/// Snapshots are immutable; lifecycle operations return a new transaction,
/// paired with a notification record where one is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub merchant_ref: String,
    pub internal_ref: String,
    pub amount: Money,
    pub fee: Money,
    pub net_amount: Money,
    pub retry_count: u32,
    pub status: TransactionStatus,
    pub idempotency_key: String,
    pub customer_debit_status: DebitStatus,
    pub settlement_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Constructs a new transaction in `Initiated`, with
    /// `net_amount = amount - fee` and a fresh internal reference.
    pub fn initiate(
        merchant_id: Uuid,
        merchant_ref: impl Into<String>,
        amount: Money,
        fee: Money,
        idempotency_key: impl Into<String>,
    ) -> Result<(Transaction, DomainEvent)> {
        let net_amount = amount.subtract(&fee)?;
        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            merchant_id,
            merchant_ref: merchant_ref.into(),
            internal_ref: generate_internal_ref(),
            amount,
            fee,
            net_amount,
            retry_count: 0,
            status: TransactionStatus::Initiated,
            idempotency_key: idempotency_key.into(),
            customer_debit_status: DebitStatus::Pending,
            settlement_batch_id: None,
            created_at: now,
            updated_at: now,
        };
        let event = DomainEvent::TransactionInitiated {
            transaction_id: tx.id,
            merchant_id,
            merchant_ref: tx.merchant_ref.clone(),
            internal_ref: tx.internal_ref.clone(),
            amount,
            idempotency_key: tx.idempotency_key.clone(),
            occurred_at: now,
        };
        Ok((tx, event))
    }

    /// Constructs a transaction directly in terminal `Failed`. Used when the
    /// reservation itself could not be obtained, so no transfer was attempted
    /// and no reservation is consumed.
    pub fn create_failed(
        merchant_id: Uuid,
        amount: Money,
        fee: Money,
        idempotency_key: impl Into<String>,
    ) -> Result<(Transaction, DomainEvent)> {
        let net_amount = amount.subtract(&fee)?;
        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            merchant_id,
            merchant_ref: String::new(),
            internal_ref: generate_internal_ref(),
            amount,
            fee,
            net_amount,
            retry_count: 0,
            status: TransactionStatus::Failed,
            idempotency_key: idempotency_key.into(),
            customer_debit_status: DebitStatus::Failed,
            settlement_batch_id: None,
            created_at: now,
            updated_at: now,
        };
        let event = DomainEvent::TransactionCompleted {
            transaction_id: tx.id,
            merchant_id,
            internal_ref: tx.internal_ref.clone(),
            status: TransactionStatus::Failed,
            amount,
            fee,
            net_amount,
            occurred_at: now,
        };
        Ok((tx, event))
    }

    /// Total the merchant is debited for this payment: amount plus fee.
    pub fn total_merchant_debit(&self) -> Result<Money> {
        self.amount.add(&self.fee)
    }

    /// Finalizes the transfer outcome. Legal only from `Initiated` or `Pending`.
    pub fn complete(&self, success: bool) -> Result<(Transaction, DomainEvent)> {
        if !matches!(
            self.status,
            TransactionStatus::Initiated | TransactionStatus::Pending
        ) {
            return Err(PaymentError::State(format!(
                "Only initiated or pending transactions can be completed, found {:?}",
                self.status
            )));
        }
        let (status, debit_status) = if success {
            (TransactionStatus::Success, DebitStatus::Debited)
        } else {
            (TransactionStatus::Failed, DebitStatus::Failed)
        };
        let now = Utc::now();
        let tx = Transaction {
            status,
            customer_debit_status: debit_status,
            updated_at: now,
            ..self.clone()
        };
        let event = DomainEvent::TransactionCompleted {
            transaction_id: tx.id,
            merchant_id: tx.merchant_id,
            internal_ref: tx.internal_ref.clone(),
            status,
            amount: tx.amount,
            fee: tx.fee,
            net_amount: tx.net_amount,
            occurred_at: now,
        };
        Ok((tx, event))
    }

    /// Legal only from `Initiated`.
    pub fn mark_as_pending(&self) -> Result<Transaction> {
        if self.status != TransactionStatus::Initiated {
            return Err(PaymentError::State(
                "Only initiated transactions can be marked as pending".to_string(),
            ));
        }
        Ok(Transaction {
            status: TransactionStatus::Pending,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Assigns this transaction to a settlement batch. Legal only from
    /// `Success` with no batch already assigned.
    pub fn settle(&self, batch_id: Uuid) -> Result<(Transaction, DomainEvent)> {
        if self.settlement_batch_id.is_some() {
            return Err(PaymentError::Conflict(format!(
                "Transaction {} is already settled",
                self.id
            )));
        }
        if self.status != TransactionStatus::Success {
            return Err(PaymentError::State(format!(
                "Only successful transactions can be settled, found {:?}",
                self.status
            )));
        }
        let now = Utc::now();
        let tx = Transaction {
            status: TransactionStatus::Settled,
            settlement_batch_id: Some(batch_id),
            updated_at: now,
            ..self.clone()
        };
        let event = DomainEvent::TransactionSettled {
            transaction_id: tx.id,
            merchant_id: tx.merchant_id,
            batch_id,
            amount: tx.amount,
            fee: tx.fee,
            net_amount: tx.net_amount,
            occurred_at: now,
        };
        Ok((tx, event))
    }

    /// Monotonic retry counter; no status change.
    pub fn increment_retry_count(&self) -> Transaction {
        Transaction {
            retry_count: self.retry_count + 1,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn can_be_retried(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Initiated | TransactionStatus::Pending
        )
    }

    pub fn can_be_settled(&self) -> bool {
        self.status == TransactionStatus::Success && self.settlement_batch_id.is_none()
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Success | TransactionStatus::Failed
        )
    }
}

fn generate_internal_ref() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("TXN_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::Ngn).unwrap()
    }

    fn initiated() -> Transaction {
        Transaction::initiate(
            Uuid::new_v4(),
            "order-1",
            money(dec!(100.00)),
            money(dec!(1.50)),
            "idem-1",
        )
        .unwrap()
        .0
    }

    #[test]
    fn test_initiate_computes_net_amount() {
        let (tx, event) = Transaction::initiate(
            Uuid::new_v4(),
            "order-1",
            money(dec!(100.00)),
            money(dec!(1.50)),
            "idem-1",
        )
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Initiated);
        assert_eq!(tx.net_amount, money(dec!(98.50)));
        assert_eq!(tx.customer_debit_status, DebitStatus::Pending);
        assert!(tx.internal_ref.starts_with("TXN_"));
        assert_eq!(event.kind(), "transaction_initiated");
    }

    #[test]
    fn test_create_failed_is_terminal() {
        let (tx, event) =
            Transaction::create_failed(Uuid::new_v4(), money(dec!(10)), money(dec!(0.15)), "k")
                .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.customer_debit_status, DebitStatus::Failed);
        assert_eq!(event.kind(), "transaction_completed");
        assert!(tx.complete(true).is_err());
    }

    #[test]
    fn test_complete_success_and_failure() {
        let (ok_tx, _) = initiated().complete(true).unwrap();
        assert_eq!(ok_tx.status, TransactionStatus::Success);
        assert_eq!(ok_tx.customer_debit_status, DebitStatus::Debited);

        let (failed_tx, _) = initiated().complete(false).unwrap();
        assert_eq!(failed_tx.status, TransactionStatus::Failed);
        assert_eq!(failed_tx.customer_debit_status, DebitStatus::Failed);
    }

    #[test]
    fn test_complete_from_pending() {
        let pending = initiated().mark_as_pending().unwrap();
        assert!(pending.complete(true).is_ok());
    }

    #[test]
    fn test_mark_as_pending_only_from_initiated() {
        let (success, _) = initiated().complete(true).unwrap();
        assert!(success.mark_as_pending().is_err());
    }

    #[test]
    fn test_settle_only_from_success() {
        let batch_id = Uuid::new_v4();
        let tx = initiated();
        assert!(tx.settle(batch_id).is_err());

        let (success, _) = tx.complete(true).unwrap();
        let (settled, event) = success.settle(batch_id).unwrap();
        assert_eq!(settled.status, TransactionStatus::Settled);
        assert_eq!(settled.settlement_batch_id, Some(batch_id));
        assert_eq!(event.kind(), "transaction_settled");

        // Terminal: settling again is a conflict, not a mutation.
        assert!(matches!(
            settled.settle(Uuid::new_v4()),
            Err(PaymentError::Conflict(_))
        ));
    }

    #[test]
    fn test_retry_count_is_monotonic() {
        let tx = initiated();
        let tx = tx.increment_retry_count().increment_retry_count();
        assert_eq!(tx.retry_count, 2);
        assert_eq!(tx.status, TransactionStatus::Initiated);
    }

    #[test]
    fn test_transition_table() {
        use TransactionStatus::*;
        assert!(Initiated.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Success));
        assert!(Pending.can_transition_to(Failed));
        assert!(Success.can_transition_to(Settled));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Settled.can_transition_to(Success));
        assert!(!Success.can_transition_to(Pending));
    }

    #[test]
    fn test_total_merchant_debit() {
        let tx = initiated();
        assert_eq!(tx.total_merchant_debit().unwrap(), money(dec!(101.50)));
    }
}
