use crate::application::engine::PaymentEngine;
use crate::domain::money::{Currency, Money};
use crate::domain::settlement::SettlementBatch;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Command to batch a merchant's settle-eligible transactions.
#[derive(Debug, Clone)]
pub struct SettleTransactions {
    pub merchant_id: Uuid,
    pub limit: usize,
}

/// Outcome of a settlement run. `batch_id` is `None` when nothing was
/// eligible; that is a normal result, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub batch_id: Option<Uuid>,
    pub batch_ref: String,
    pub merchant_id: Uuid,
    pub total_amount: Decimal,
    pub total_fee: Decimal,
    pub net_amount: Decimal,
    pub currency: Currency,
    /// Count of transactions actually re-tagged with the batch, which may be
    /// lower than the number selected if a concurrent run settled some first.
    pub transaction_count: usize,
    pub message: String,
}

impl PaymentEngine {
    /// Batches up to `limit` of the merchant's settle-eligible transactions
    /// (`Success`, no batch id, oldest first) into one payable unit.
    ///
    /// When more than one currency is eligible, only the first-encountered
    /// currency is settled in this run; the rest stay eligible for the next.
    pub async fn settle_transactions(
        &self,
        command: SettleTransactions,
    ) -> Result<SettlementSummary> {
        info!(
            merchant_id = %command.merchant_id,
            limit = command.limit,
            "starting settlement run"
        );

        self.merchants
            .find_by_id(command.merchant_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Merchant {}", command.merchant_id)))?;

        let settlable = self
            .settlements
            .find_settlable_transactions(command.merchant_id, command.limit)
            .await?;

        if settlable.is_empty() {
            info!(merchant_id = %command.merchant_id, "no settlable transactions");
            return Ok(SettlementSummary {
                batch_id: None,
                batch_ref: String::new(),
                merchant_id: command.merchant_id,
                total_amount: Decimal::ZERO,
                total_fee: Decimal::ZERO,
                net_amount: Decimal::ZERO,
                currency: Currency::Usd,
                transaction_count: 0,
                message: "No transactions available for settlement".to_string(),
            });
        }

        // Single-currency batches: group, then settle only the currency of
        // the oldest eligible transaction. Other currencies wait for the
        // next run.
        let mut by_currency: HashMap<Currency, Vec<&Transaction>> = HashMap::new();
        for tx in &settlable {
            by_currency.entry(tx.amount.currency()).or_default().push(tx);
        }
        if by_currency.len() > 1 {
            warn!(
                merchant_id = %command.merchant_id,
                currencies = by_currency.len(),
                "multiple currencies eligible, settling one per run"
            );
        }
        let primary_currency = settlable[0].amount.currency();
        let to_settle = &by_currency[&primary_currency];

        let mut total_amount = Money::zero(primary_currency);
        let mut total_fee = Money::zero(primary_currency);
        for tx in to_settle {
            total_amount = total_amount.add(&tx.amount)?;
            total_fee = total_fee.add(&tx.fee)?;
        }

        let (batch, created_event) = SettlementBatch::create(
            command.merchant_id,
            total_amount,
            total_fee,
            to_settle.len(),
        )?;
        let saved_batch = self.settlements.save_batch(batch).await?;

        let ids: Vec<Uuid> = to_settle.iter().map(|tx| tx.id).collect();
        let updated_count = self
            .settlements
            .update_transactions_with_batch(&ids, saved_batch.id)
            .await?;
        if updated_count != ids.len() {
            warn!(
                batch_id = %saved_batch.id,
                selected = ids.len(),
                updated = updated_count,
                "settlement reconciliation mismatch"
            );
        }

        self.publish(created_event).await;
        info!(
            batch_id = %saved_batch.id,
            batch_ref = %saved_batch.batch_ref,
            transactions = updated_count,
            "settlement batch created"
        );

        Ok(SettlementSummary {
            batch_id: Some(saved_batch.id),
            batch_ref: saved_batch.batch_ref.clone(),
            merchant_id: saved_batch.merchant_id,
            total_amount: saved_batch.total_amount.amount(),
            total_fee: saved_batch.total_fee.amount(),
            net_amount: saved_batch.net_amount.amount(),
            currency: saved_batch.total_amount.currency(),
            transaction_count: updated_count,
            message: "Settlement batch created successfully".to_string(),
        })
    }

    pub async fn find_settlement_batch(&self, batch_id: Uuid) -> Result<SettlementBatch> {
        self.settlements
            .find_batch_by_id(batch_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Settlement batch {batch_id}")))
    }

    pub async fn list_settlement_batches(
        &self,
        merchant_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SettlementBatch>> {
        self.settlements
            .find_batches_by_merchant(merchant_id, limit, offset)
            .await
    }
}
