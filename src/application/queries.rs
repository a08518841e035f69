use crate::application::engine::PaymentEngine;
use crate::application::initiation::TransactionResult;
use crate::domain::ports::{PageRequest, TransactionFilter};
use crate::domain::transaction::TransactionStatus;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Paged, filtered listing of a merchant's transactions.
#[derive(Debug, Clone)]
pub struct ListTransactions {
    pub merchant_id: Uuid,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionListResult {
    pub transactions: Vec<TransactionResult>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaymentEngine {
    /// Lists a merchant's transactions with optional status and created-at
    /// range filters. Page size is clamped to the store contract's bounds.
    pub async fn list_transactions(
        &self,
        query: ListTransactions,
    ) -> Result<TransactionListResult> {
        self.merchants
            .find_by_id(query.merchant_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Merchant {}", query.merchant_id)))?;

        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(PaymentError::Validation(
                    "fromDate cannot be after toDate".to_string(),
                ));
            }
        }

        let page = self
            .transactions
            .find_by_merchant(
                query.merchant_id,
                TransactionFilter {
                    status: query.status,
                    from: query.from,
                    to: query.to,
                },
                PageRequest::new(query.page, query.size),
            )
            .await?;

        Ok(TransactionListResult {
            has_next: page.has_next(),
            has_previous: page.has_previous(),
            transactions: page
                .content
                .iter()
                .map(|tx| TransactionResult::from_transaction(tx, "Transaction fetched successfully"))
                .collect(),
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            current_page: page.current_page,
            page_size: page.page_size,
        })
    }
}
