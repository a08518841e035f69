use crate::domain::merchant::MerchantStatus;
use crate::domain::money::Money;
use crate::domain::transaction::TransactionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification records emitted by domain operations.
///
/// Entity operations return these alongside the new snapshot; callers drain
/// and forward them to the notification sink. Delivery and ordering are the
/// sink's concern, not the domain's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    MerchantCreated {
        merchant_id: Uuid,
        business_name: String,
        email: String,
        status: MerchantStatus,
        occurred_at: DateTime<Utc>,
    },
    TransactionInitiated {
        transaction_id: Uuid,
        merchant_id: Uuid,
        merchant_ref: String,
        internal_ref: String,
        amount: Money,
        idempotency_key: String,
        occurred_at: DateTime<Utc>,
    },
    TransactionCompleted {
        transaction_id: Uuid,
        merchant_id: Uuid,
        internal_ref: String,
        status: TransactionStatus,
        amount: Money,
        fee: Money,
        net_amount: Money,
        occurred_at: DateTime<Utc>,
    },
    TransactionSettled {
        transaction_id: Uuid,
        merchant_id: Uuid,
        batch_id: Uuid,
        amount: Money,
        fee: Money,
        net_amount: Money,
        occurred_at: DateTime<Utc>,
    },
    SettlementBatchCreated {
        batch_id: Uuid,
        batch_ref: String,
        merchant_id: Uuid,
        total_amount: Money,
        total_fee: Money,
        net_amount: Money,
        transaction_count: usize,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Event kind name, useful for log lines and sink routing.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::MerchantCreated { .. } => "merchant_created",
            DomainEvent::TransactionInitiated { .. } => "transaction_initiated",
            DomainEvent::TransactionCompleted { .. } => "transaction_completed",
            DomainEvent::TransactionSettled { .. } => "transaction_settled",
            DomainEvent::SettlementBatchCreated { .. } => "settlement_batch_created",
        }
    }
}
