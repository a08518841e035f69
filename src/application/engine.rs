use crate::domain::events::DomainEvent;
use crate::domain::fees::{FeeCalculator, StandardFeeCalculator};
use crate::domain::ports::{
    FundTransferRef, MerchantStoreRef, NotificationSinkRef, SettlementStoreRef, TransactionStoreRef,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The main entry point for the ledger core.
///
/// `PaymentEngine` owns the store and collaborator ports and exposes the
/// command and query operations: merchant on-boarding, transaction
/// initiation, settlement batching and transaction listing. The operations
/// themselves live in the sibling modules, one `impl` block per flow.
pub struct PaymentEngine {
    pub(crate) merchants: MerchantStoreRef,
    pub(crate) transactions: TransactionStoreRef,
    pub(crate) settlements: SettlementStoreRef,
    pub(crate) transfer: FundTransferRef,
    pub(crate) notifications: NotificationSinkRef,
    pub(crate) fee_calculator: Arc<dyn FeeCalculator>,
    pub(crate) transfer_timeout: Duration,
}

impl PaymentEngine {
    pub fn new(
        merchants: MerchantStoreRef,
        transactions: TransactionStoreRef,
        settlements: SettlementStoreRef,
        transfer: FundTransferRef,
        notifications: NotificationSinkRef,
    ) -> Self {
        Self {
            merchants,
            transactions,
            settlements,
            transfer,
            notifications,
            fee_calculator: Arc::new(StandardFeeCalculator::default()),
            transfer_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_fee_calculator(mut self, fee_calculator: Arc<dyn FeeCalculator>) -> Self {
        self.fee_calculator = fee_calculator;
        self
    }

    /// Bounds the external transfer call; an elapsed timeout is treated as an
    /// unknown (retryable) outcome, never as success.
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Forwards a notification to the sink. Delivery failures are logged and
    /// swallowed: notifications are best-effort and must never roll back a
    /// committed ledger mutation.
    pub(crate) async fn publish(&self, event: DomainEvent) {
        let kind = event.kind();
        if let Err(e) = self.notifications.publish(event).await {
            warn!(kind, error = %e, "failed to publish notification");
        }
    }
}
