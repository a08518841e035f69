use paylock::application::engine::PaymentEngine;
use paylock::application::merchants::{CreateMerchant, MerchantResult};
use paylock::infrastructure::in_memory::InMemoryStore;
use paylock::infrastructure::notifications::RecordingNotificationSink;
use paylock::infrastructure::transfer::MockTransferService;
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct TestContext {
    pub engine: PaymentEngine,
    pub store: InMemoryStore,
    pub sink: Arc<RecordingNotificationSink>,
}

/// Builds an engine on a fresh in-memory store whose mock transfer network
/// replays the given outcome codes (the last one repeats).
pub fn engine_with_codes<const N: usize>(codes: [&str; N]) -> TestContext {
    engine_with_transfer(MockTransferService::with_codes(codes))
}

pub fn engine_with_transfer(transfer: MockTransferService) -> TestContext {
    let store = InMemoryStore::new();
    let sink = Arc::new(RecordingNotificationSink::new());
    let engine = PaymentEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(transfer),
        sink.clone(),
    );
    TestContext { engine, store, sink }
}

pub async fn onboard_merchant(ctx: &TestContext, balance: Decimal) -> MerchantResult {
    ctx.engine
        .create_merchant(CreateMerchant {
            business_name: "Acme Stores Ltd".to_string(),
            email: format!("merchant-{}@acme.test", uuid::Uuid::new_v4()),
            settlement_account: "0011223344".to_string(),
            opening_balance: balance,
        })
        .await
        .expect("merchant on-boarding failed")
}
