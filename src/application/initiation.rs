use crate::application::engine::PaymentEngine;
use crate::domain::merchant::Merchant;
use crate::domain::money::{Currency, Money};
use crate::domain::ports::{TransferOutcome, TransferRequest};
use crate::domain::transaction::{DebitStatus, Transaction, TransactionStatus};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Command to initiate a merchant payment.
#[derive(Debug, Clone)]
pub struct InitiateTransaction {
    pub merchant_id: Uuid,
    pub merchant_ref: String,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
}

/// Outcome of an initiation, including the human-readable status message.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResult {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub merchant_ref: String,
    pub internal_ref: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: TransactionStatus,
    pub customer_debit_status: DebitStatus,
    pub retry_count: u32,
    pub settlement_batch_id: Option<Uuid>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message: String,
    /// True when the idempotency key matched an existing transaction and no
    /// new work was performed.
    pub already_exists: bool,
}

impl TransactionResult {
    pub fn from_transaction(tx: &Transaction, message: impl Into<String>) -> Self {
        Self {
            id: tx.id,
            merchant_id: tx.merchant_id,
            merchant_ref: tx.merchant_ref.clone(),
            internal_ref: tx.internal_ref.clone(),
            amount: tx.amount.amount(),
            currency: tx.amount.currency(),
            fee: tx.fee.amount(),
            net_amount: tx.net_amount.amount(),
            status: tx.status,
            customer_debit_status: tx.customer_debit_status,
            retry_count: tx.retry_count,
            settlement_batch_id: tx.settlement_batch_id,
            idempotency_key: tx.idempotency_key.clone(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            message: message.into(),
            already_exists: false,
        }
    }

    fn existing(tx: &Transaction) -> Self {
        Self {
            already_exists: true,
            ..Self::from_transaction(tx, "Transaction already exists")
        }
    }
}

impl PaymentEngine {
    /// Initiates a payment: idempotency check, funds reservation, external
    /// transfer, and the resulting lifecycle transition.
    ///
    /// Steps before the reservation fail fast with no side effects. A failed
    /// reservation is the one failure path that still mutates state: the
    /// merchant's failed-attempt counter is bumped (suspending the account at
    /// the threshold) and a terminal `Failed` transaction is recorded. The
    /// transfer call never fails the flow; every outcome, including timeouts
    /// and collaborator errors, is interpreted as data.
    pub async fn initiate_transaction(
        &self,
        command: InitiateTransaction,
    ) -> Result<TransactionResult> {
        let currency = Currency::from_code(&command.currency)?;

        if let Some(existing) = self
            .transactions
            .find_by_idempotency_key(&command.idempotency_key)
            .await?
        {
            info!(
                transaction_id = %existing.id,
                idempotency_key = %command.idempotency_key,
                "idempotent replay, returning existing transaction"
            );
            return Ok(TransactionResult::existing(&existing));
        }

        let merchant = self
            .merchants
            .find_by_id(command.merchant_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Merchant {}", command.merchant_id)))?;
        if !merchant.is_active() {
            return Err(PaymentError::AccountSuspended(merchant.id));
        }

        let amount = Money::new(command.amount, currency)?;
        let fee = self.fee_calculator.calculate_fee(&amount)?;
        let total_to_reserve = amount.add(&fee)?;

        let reserved = match merchant.reserve(total_to_reserve.amount()) {
            Ok(reserved) => reserved,
            Err(PaymentError::InsufficientFunds(_)) => {
                return self
                    .record_failed_reservation(&command, &merchant, amount, fee)
                    .await;
            }
            Err(e) => return Err(e),
        };
        self.merchants
            .update_guarded(reserved.clone(), merchant.balance, merchant.locked_balance)
            .await?;

        let (tx, initiated_event) = Transaction::initiate(
            merchant.id,
            command.merchant_ref.clone(),
            amount,
            fee,
            command.idempotency_key.clone(),
        )?;
        let saved = match self.transactions.insert(tx).await {
            Ok(saved) => saved,
            Err(PaymentError::DuplicateIdempotencyKey(key)) => {
                // A concurrent initiation with the same key won the insert.
                // Give back our reservation and return the winner's transaction.
                return self.resolve_lost_insert_race(&reserved, &total_to_reserve, &key).await;
            }
            Err(e) => return Err(e),
        };
        self.publish(initiated_event).await;

        let outcome = self.execute_transfer(&merchant, &saved, &amount).await;

        let final_tx = match outcome {
            TransferOutcome::Success => {
                let debited = reserved.debit(total_to_reserve.amount())?;
                self.merchants
                    .update_guarded(debited, reserved.balance, reserved.locked_balance)
                    .await?;
                let (completed, event) = saved.complete(true)?;
                self.publish(event).await;
                completed
            }
            TransferOutcome::Retryable | TransferOutcome::Unknown => {
                // Reservation stays held; the caller drives retries.
                saved.increment_retry_count()
            }
        };

        let updated = self.transactions.update(final_tx).await?;
        let message = match updated.status {
            TransactionStatus::Success => "Transaction completed successfully",
            TransactionStatus::Pending => "Transaction pending",
            TransactionStatus::Failed => "Transaction failed",
            _ => "Transaction initiated",
        };
        Ok(TransactionResult::from_transaction(&updated, message))
    }

    /// Failed-attempt bookkeeping for a reservation that could not be
    /// obtained: no transfer is attempted and no reservation is consumed.
    async fn record_failed_reservation(
        &self,
        command: &InitiateTransaction,
        merchant: &Merchant,
        amount: Money,
        fee: Money,
    ) -> Result<TransactionResult> {
        let flagged = merchant.increment_failed_attempts();
        warn!(
            merchant_id = %merchant.id,
            failed_attempts = flagged.failed_attempts,
            suspended = !flagged.is_active(),
            "reservation refused, insufficient available balance"
        );
        self.merchants
            .update_guarded(flagged, merchant.balance, merchant.locked_balance)
            .await?;

        let (failed_tx, event) =
            Transaction::create_failed(merchant.id, amount, fee, command.idempotency_key.clone())?;
        self.transactions.insert(failed_tx).await?;
        self.publish(event).await;

        Err(PaymentError::InsufficientFunds(merchant.id))
    }

    async fn resolve_lost_insert_race(
        &self,
        reserved: &Merchant,
        total_to_reserve: &Money,
        key: &str,
    ) -> Result<TransactionResult> {
        warn!(
            merchant_id = %reserved.id,
            idempotency_key = %key,
            "lost idempotency insert race, releasing reservation"
        );
        let released = reserved.release(total_to_reserve.amount())?;
        self.merchants
            .update_guarded(released, reserved.balance, reserved.locked_balance)
            .await?;
        let winner = self
            .transactions
            .find_by_idempotency_key(key)
            .await?
            .ok_or_else(|| {
                PaymentError::Internal(format!(
                    "duplicate idempotency key {key} reported but no transaction found"
                ))
            })?;
        Ok(TransactionResult::existing(&winner))
    }

    /// Invokes the transfer collaborator under the configured timeout and
    /// classifies the result. Failures and timeouts come back as data.
    async fn execute_transfer(
        &self,
        merchant: &Merchant,
        tx: &Transaction,
        amount: &Money,
    ) -> TransferOutcome {
        let request = TransferRequest {
            sender_account: merchant.settlement_account.clone(),
            recipient_account: String::new(),
            amount: amount.amount(),
            currency: amount.currency().code().to_string(),
            reference: tx.internal_ref.clone(),
        };

        let response =
            tokio::time::timeout(self.transfer_timeout, self.transfer.initiate_transfer(request))
                .await;
        match response {
            Ok(Ok(response)) => {
                let outcome = TransferOutcome::from_code(&response.outcome_code);
                match outcome {
                    TransferOutcome::Success => {}
                    TransferOutcome::Retryable => warn!(
                        transaction_id = %tx.id,
                        code = %response.outcome_code,
                        "retryable transfer code"
                    ),
                    TransferOutcome::Unknown => error!(
                        transaction_id = %tx.id,
                        code = %response.outcome_code,
                        "unknown transfer code"
                    ),
                }
                outcome
            }
            Ok(Err(e)) => {
                error!(transaction_id = %tx.id, error = %e, "transfer call failed");
                TransferOutcome::Unknown
            }
            Err(_) => {
                error!(
                    transaction_id = %tx.id,
                    timeout_ms = self.transfer_timeout.as_millis() as u64,
                    "transfer call timed out"
                );
                TransferOutcome::Unknown
            }
        }
    }
}
