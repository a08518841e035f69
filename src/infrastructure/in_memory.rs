use crate::domain::merchant::Merchant;
use crate::domain::ports::{
    MerchantStore, Page, PageRequest, SettlementStore, TransactionFilter, TransactionStore,
};
use crate::domain::settlement::SettlementBatch;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thread-safe in-memory backing store for the whole ledger.
///
/// One struct implements all three store ports so the settlement operations
/// can see the same transactions the initiation flow writes. `Clone` shares
/// the underlying maps. Writes that the contracts require to be atomic
/// (idempotency-key insert, guarded merchant update, batch re-tagging) hold a
/// single write lock for the full check-then-write.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    merchants: Arc<RwLock<HashMap<Uuid, Merchant>>>,
    transactions: Arc<RwLock<TransactionTable>>,
    batches: Arc<RwLock<HashMap<Uuid, SettlementBatch>>>,
}

#[derive(Default)]
struct TransactionTable {
    by_id: HashMap<Uuid, Transaction>,
    // Unique constraint on the idempotency key.
    by_key: HashMap<String, Uuid>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantStore for InMemoryStore {
    async fn save(&self, merchant: Merchant) -> Result<Merchant> {
        let mut merchants = self.merchants.write().await;
        merchants.insert(merchant.id, merchant.clone());
        Ok(merchant)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Merchant>> {
        let merchants = self.merchants.read().await;
        Ok(merchants.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Merchant>> {
        let merchants = self.merchants.read().await;
        Ok(merchants.values().find(|m| m.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let merchants = self.merchants.read().await;
        Ok(merchants.values().any(|m| m.email == email))
    }

    async fn update_guarded(
        &self,
        updated: Merchant,
        expected_balance: Decimal,
        expected_locked: Decimal,
    ) -> Result<Merchant> {
        let mut merchants = self.merchants.write().await;
        let current = merchants
            .get(&updated.id)
            .ok_or_else(|| PaymentError::NotFound(format!("Merchant {}", updated.id)))?;
        if current.balance != expected_balance || current.locked_balance != expected_locked {
            return Err(PaymentError::Concurrency(format!(
                "merchant {} was modified concurrently",
                updated.id
            )));
        }
        merchants.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn insert(&self, tx: Transaction) -> Result<Transaction> {
        let mut table = self.transactions.write().await;
        if table.by_key.contains_key(&tx.idempotency_key) {
            return Err(PaymentError::DuplicateIdempotencyKey(
                tx.idempotency_key.clone(),
            ));
        }
        table.by_key.insert(tx.idempotency_key.clone(), tx.id);
        table.by_id.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>> {
        let table = self.transactions.read().await;
        Ok(table
            .by_key
            .get(key)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let table = self.transactions.read().await;
        Ok(table.by_id.get(&id).cloned())
    }

    async fn update(&self, tx: Transaction) -> Result<Transaction> {
        let mut table = self.transactions.write().await;
        if !table.by_id.contains_key(&tx.id) {
            return Err(PaymentError::NotFound(format!("Transaction {}", tx.id)));
        }
        table.by_id.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn find_by_merchant(
        &self,
        merchant_id: Uuid,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>> {
        let table = self.transactions.read().await;
        let mut matches: Vec<Transaction> = table
            .by_id
            .values()
            .filter(|tx| tx.merchant_id == merchant_id)
            .filter(|tx| filter.status.is_none_or(|s| tx.status == s))
            .filter(|tx| filter.from.is_none_or(|from| tx.created_at >= from))
            .filter(|tx| filter.to.is_none_or(|to| tx.created_at <= to))
            .cloned()
            .collect();
        // Newest first for listings.
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_elements = matches.len();
        let total_pages = total_elements.div_ceil(page.size);
        let content = matches
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();

        Ok(Page {
            content,
            total_elements,
            total_pages,
            current_page: page.page,
            page_size: page.size,
        })
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn find_settlable_transactions(
        &self,
        merchant_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let table = self.transactions.read().await;
        let mut eligible: Vec<Transaction> = table
            .by_id
            .values()
            .filter(|tx| tx.merchant_id == merchant_id && tx.can_be_settled())
            .cloned()
            .collect();
        // Oldest first: FIFO fairness across settlement runs.
        eligible.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        eligible.truncate(limit);
        Ok(eligible)
    }

    async fn save_batch(&self, batch: SettlementBatch) -> Result<SettlementBatch> {
        let mut batches = self.batches.write().await;
        batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn update_transactions_with_batch(&self, ids: &[Uuid], batch_id: Uuid) -> Result<usize> {
        let mut table = self.transactions.write().await;
        let mut updated = 0;
        for id in ids {
            // Conditional update: skip anything a concurrent run already
            // settled or that left Success in the meantime.
            let Some(tx) = table.by_id.get(id) else {
                continue;
            };
            if !tx.can_be_settled() {
                continue;
            }
            let (settled, _event) = tx.settle(batch_id)?;
            table.by_id.insert(*id, settled);
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_batch_by_id(&self, batch_id: Uuid) -> Result<Option<SettlementBatch>> {
        let batches = self.batches.read().await;
        Ok(batches.get(&batch_id).cloned())
    }

    async fn find_batches_by_merchant(
        &self,
        merchant_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SettlementBatch>> {
        let batches = self.batches.read().await;
        let mut matches: Vec<SettlementBatch> = batches
            .values()
            .filter(|b| b.merchant_id == merchant_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Currency, Money};
    use rust_decimal_macros::dec;

    fn money(amount: Decimal) -> Money {
        Money::new(amount, Currency::Ngn).unwrap()
    }

    fn success_tx(merchant_id: Uuid, key: &str) -> Transaction {
        let (tx, _) = Transaction::initiate(
            merchant_id,
            "ref",
            money(dec!(100)),
            money(dec!(1.50)),
            key,
        )
        .unwrap();
        tx.complete(true).unwrap().0
    }

    #[tokio::test]
    async fn test_merchant_guarded_update_detects_interference() {
        let store = InMemoryStore::new();
        let (merchant, _) = Merchant::create("Acme", "a@b.co", "123", dec!(1000)).unwrap();
        store.save(merchant.clone()).await.unwrap();

        let reserved = merchant.reserve(dec!(100)).unwrap();
        store
            .update_guarded(reserved.clone(), merchant.balance, merchant.locked_balance)
            .await
            .unwrap();

        // A second writer still holding the stale snapshot must be rejected.
        let stale = merchant.reserve(dec!(50)).unwrap();
        let result = store
            .update_guarded(stale, merchant.balance, merchant.locked_balance)
            .await;
        assert!(matches!(result, Err(PaymentError::Concurrency(_))));
    }

    #[tokio::test]
    async fn test_merchant_email_lookup() {
        let store = InMemoryStore::new();
        let (merchant, _) = Merchant::create("Acme", "ops@acme.test", "123", dec!(0)).unwrap();
        store.save(merchant.clone()).await.unwrap();

        assert!(store.exists_by_email("ops@acme.test").await.unwrap());
        assert!(!store.exists_by_email("other@acme.test").await.unwrap());
        assert_eq!(
            store.find_by_email("ops@acme.test").await.unwrap().unwrap().id,
            merchant.id
        );
    }

    #[tokio::test]
    async fn test_insert_enforces_idempotency_key_uniqueness() {
        let store = InMemoryStore::new();
        let merchant_id = Uuid::new_v4();
        let (first, _) = Transaction::initiate(
            merchant_id,
            "ref",
            money(dec!(10)),
            money(dec!(0.15)),
            "same-key",
        )
        .unwrap();
        let (second, _) = Transaction::initiate(
            merchant_id,
            "ref",
            money(dec!(10)),
            money(dec!(0.15)),
            "same-key",
        )
        .unwrap();

        store.insert(first).await.unwrap();
        let result = store.insert(second).await;
        assert!(matches!(
            result,
            Err(PaymentError::DuplicateIdempotencyKey(_))
        ));
    }

    #[tokio::test]
    async fn test_settlable_transactions_are_oldest_first_and_limited() {
        let store = InMemoryStore::new();
        let merchant_id = Uuid::new_v4();
        for i in 0..5 {
            store
                .insert(success_tx(merchant_id, &format!("k{i}")))
                .await
                .unwrap();
        }

        let eligible = store
            .find_settlable_transactions(merchant_id, 3)
            .await
            .unwrap();
        assert_eq!(eligible.len(), 3);
        assert!(eligible.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_batch_retag_skips_already_settled() {
        let store = InMemoryStore::new();
        let merchant_id = Uuid::new_v4();
        let a = store.insert(success_tx(merchant_id, "a")).await.unwrap();
        let b = store.insert(success_tx(merchant_id, "b")).await.unwrap();

        // Concurrent run settles `b` before we re-tag.
        let stolen = b.settle(Uuid::new_v4()).unwrap().0;
        store.update(stolen).await.unwrap();

        let batch_id = Uuid::new_v4();
        let count = store
            .update_transactions_with_batch(&[a.id, b.id], batch_id)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let a_after = TransactionStore::find_by_id(&store, a.id).await.unwrap().unwrap();
        assert_eq!(a_after.settlement_batch_id, Some(batch_id));
        let b_after = TransactionStore::find_by_id(&store, b.id).await.unwrap().unwrap();
        assert_ne!(b_after.settlement_batch_id, Some(batch_id));
    }

    #[tokio::test]
    async fn test_find_by_merchant_pages_and_filters() {
        let store = InMemoryStore::new();
        let merchant_id = Uuid::new_v4();
        for i in 0..25 {
            store
                .insert(success_tx(merchant_id, &format!("k{i}")))
                .await
                .unwrap();
        }

        let page = store
            .find_by_merchant(
                merchant_id,
                TransactionFilter::default(),
                PageRequest::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(page.content.len(), 10);
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let filtered = store
            .find_by_merchant(
                merchant_id,
                TransactionFilter {
                    status: Some(crate::domain::transaction::TransactionStatus::Failed),
                    ..Default::default()
                },
                PageRequest::new(0, 10),
            )
            .await
            .unwrap();
        assert_eq!(filtered.total_elements, 0);
    }
}
