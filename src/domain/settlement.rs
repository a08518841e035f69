use crate::domain::events::DomainEvent;
use crate::domain::money::Money;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementStatus {
    Created,
    Processed,
    Completed,
    Failed,
}

/// An aggregation of settle-eligible transactions into one payable unit.
///
/// Lifecycle: `Created -> Processed -> Completed`, or `-> Failed` from
/// `Created`/`Processed`. Totals are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementBatch {
    pub id: Uuid,
    pub batch_ref: String,
    pub merchant_id: Uuid,
    pub total_amount: Money,
    pub total_fee: Money,
    pub net_amount: Money,
    pub transaction_count: usize,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettlementBatch {
    /// Creates a batch in `Created`, with `net_amount = total_amount - total_fee`.
    /// Fails if the batch would be empty or the totals' currencies differ.
    pub fn create(
        merchant_id: Uuid,
        total_amount: Money,
        total_fee: Money,
        transaction_count: usize,
    ) -> Result<(SettlementBatch, DomainEvent)> {
        if transaction_count == 0 {
            return Err(PaymentError::Validation(
                "Cannot create settlement batch with no transactions".to_string(),
            ));
        }
        if total_amount.currency() != total_fee.currency() {
            return Err(PaymentError::Validation(
                "Total amount and fee must use the same currency".to_string(),
            ));
        }
        let net_amount = total_amount.subtract(&total_fee)?;
        let now = Utc::now();
        let batch = SettlementBatch {
            id: Uuid::new_v4(),
            batch_ref: generate_batch_ref(),
            merchant_id,
            total_amount,
            total_fee,
            net_amount,
            transaction_count,
            status: SettlementStatus::Created,
            created_at: now,
            updated_at: now,
        };
        let event = DomainEvent::SettlementBatchCreated {
            batch_id: batch.id,
            batch_ref: batch.batch_ref.clone(),
            merchant_id,
            total_amount,
            total_fee,
            net_amount,
            transaction_count,
            occurred_at: now,
        };
        Ok((batch, event))
    }

    pub fn process(&self) -> Result<SettlementBatch> {
        if self.status != SettlementStatus::Created {
            return Err(PaymentError::State(
                "Only created batches can be processed".to_string(),
            ));
        }
        Ok(self.with_status(SettlementStatus::Processed))
    }

    pub fn complete(&self) -> Result<SettlementBatch> {
        if self.status != SettlementStatus::Processed {
            return Err(PaymentError::State(
                "Only processed batches can be completed".to_string(),
            ));
        }
        Ok(self.with_status(SettlementStatus::Completed))
    }

    pub fn fail(&self) -> Result<SettlementBatch> {
        if !matches!(
            self.status,
            SettlementStatus::Created | SettlementStatus::Processed
        ) {
            return Err(PaymentError::State(
                "Only created or processed batches can be failed".to_string(),
            ));
        }
        Ok(self.with_status(SettlementStatus::Failed))
    }

    fn with_status(&self, status: SettlementStatus) -> SettlementBatch {
        SettlementBatch {
            status,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

fn generate_batch_ref() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(10000..100000);
    format!("BATCH_{millis}_{suffix}")
}
