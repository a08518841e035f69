use crate::domain::events::DomainEvent;
use crate::domain::merchant::Merchant;
use crate::domain::settlement::SettlementBatch;
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub type MerchantStoreRef = Arc<dyn MerchantStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type SettlementStoreRef = Arc<dyn SettlementStore>;
pub type FundTransferRef = Arc<dyn FundTransfer>;
pub type NotificationSinkRef = Arc<dyn NotificationSink>;

/// Page request with a clamped size. Pages are zero-based.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 20;
    pub const MAX_SIZE: usize = 100;

    pub fn new(page: usize, size: usize) -> Self {
        let size = match size {
            0 => Self::DEFAULT_SIZE,
            s if s > Self::MAX_SIZE => Self::MAX_SIZE,
            s => s,
        };
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }
}

/// Filters for the per-merchant transaction listing.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait MerchantStore: Send + Sync {
    async fn save(&self, merchant: Merchant) -> Result<Merchant>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Merchant>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Merchant>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Compare-and-set write: applies `updated` only if the stored snapshot
    /// still carries `expected_balance`/`expected_locked`. A mismatch means a
    /// concurrent mutation won the race and yields `PaymentError::Concurrency`.
    async fn update_guarded(
        &self,
        updated: Merchant,
        expected_balance: Decimal,
        expected_locked: Decimal,
    ) -> Result<Merchant>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new transaction, enforcing idempotency-key uniqueness as a
    /// single atomic unit. A duplicate key yields
    /// `PaymentError::DuplicateIdempotencyKey`.
    async fn insert(&self, tx: Transaction) -> Result<Transaction>;
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>>;
    async fn update(&self, tx: Transaction) -> Result<Transaction>;
    async fn find_by_merchant(
        &self,
        merchant_id: Uuid,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>>;
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Settle-eligible transactions (`Success`, no batch id), oldest first.
    async fn find_settlable_transactions(
        &self,
        merchant_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>>;

    async fn save_batch(&self, batch: SettlementBatch) -> Result<SettlementBatch>;

    /// Re-tags the given ids with the batch, but only those still `Success`
    /// with no batch assigned. Returns the count actually updated, which may
    /// be lower than `ids.len()` if a concurrent run got there first.
    async fn update_transactions_with_batch(&self, ids: &[Uuid], batch_id: Uuid) -> Result<usize>;

    async fn find_batch_by_id(&self, batch_id: Uuid) -> Result<Option<SettlementBatch>>;

    async fn find_batches_by_merchant(
        &self,
        merchant_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SettlementBatch>>;
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender_account: String,
    pub recipient_account: String,
    pub amount: Decimal,
    pub currency: String,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct TransferResponse {
    pub transaction_id: String,
    pub outcome_code: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// How the ledger interprets a transfer outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Success,
    Retryable,
    Unknown,
}

impl TransferOutcome {
    /// "00" is success, "01"/"11" are explicitly retryable, anything else is
    /// unknown. Unknown is handled like retryable: funds stay reserved rather
    /// than risking a double release against a transfer that may still land.
    pub fn from_code(code: &str) -> Self {
        match code {
            "00" => TransferOutcome::Success,
            "01" | "11" => TransferOutcome::Retryable,
            _ => TransferOutcome::Unknown,
        }
    }
}

/// The external funds-transfer network. The only suspension point in the
/// core; callers bound it with a timeout.
#[async_trait]
pub trait FundTransfer: Send + Sync {
    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferResponse>;
}

/// Receives domain notifications as plain data records.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<()>;
}
