use crate::domain::ports::{FundTransfer, TransferRequest, TransferResponse};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// A stand-in for the external funds-transfer network.
///
/// Replays a scripted sequence of outcome codes, then keeps returning the
/// last one. Useful for the demo binary and for driving the initiation
/// protocol through success, retryable and unknown outcomes in tests.
pub struct MockTransferService {
    codes: Mutex<VecDeque<String>>,
    last_code: Mutex<String>,
    latency: Duration,
}

impl MockTransferService {
    /// Always answers with the given outcome code.
    pub fn with_code(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            codes: Mutex::new(VecDeque::new()),
            last_code: Mutex::new(code),
            latency: Duration::ZERO,
        }
    }

    /// Answers with the given codes in order; the final code repeats.
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<String> = codes.into_iter().map(Into::into).collect();
        let last = queue.back().cloned().unwrap_or_else(|| "00".to_string());
        Self {
            codes: Mutex::new(queue),
            last_code: Mutex::new(last),
            latency: Duration::ZERO,
        }
    }

    /// Adds artificial latency, for exercising the caller's timeout.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn next_code(&self) -> String {
        let mut codes = self.codes.lock().expect("transfer code queue poisoned");
        match codes.pop_front() {
            Some(code) => code,
            None => self.last_code.lock().expect("last code poisoned").clone(),
        }
    }
}

impl Default for MockTransferService {
    fn default() -> Self {
        Self::with_code("00")
    }
}

#[async_trait]
impl FundTransfer for MockTransferService {
    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let code = self.next_code();
        debug!(
            amount = %request.amount,
            currency = %request.currency,
            reference = %request.reference,
            code = %code,
            "mock transfer"
        );
        Ok(TransferResponse {
            transaction_id: format!("mock-{}", request.reference),
            outcome_code: code.clone(),
            status: if code == "00" { "SUCCESS" } else { "PENDING" }.to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> TransferRequest {
        TransferRequest {
            sender_account: "0011223344".to_string(),
            recipient_account: String::new(),
            amount: dec!(100),
            currency: "NGN".to_string(),
            reference: "TXN_1_1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_scripted_codes_replay_then_repeat() {
        let service = MockTransferService::with_codes(["01", "00"]);
        assert_eq!(
            service.initiate_transfer(request()).await.unwrap().outcome_code,
            "01"
        );
        assert_eq!(
            service.initiate_transfer(request()).await.unwrap().outcome_code,
            "00"
        );
        // Queue drained, last code repeats.
        assert_eq!(
            service.initiate_transfer(request()).await.unwrap().outcome_code,
            "00"
        );
    }

    #[tokio::test]
    async fn test_success_status_tracks_code() {
        let ok = MockTransferService::with_code("00");
        assert_eq!(ok.initiate_transfer(request()).await.unwrap().status, "SUCCESS");
        let retry = MockTransferService::with_code("11");
        assert_eq!(
            retry.initiate_transfer(request()).await.unwrap().status,
            "PENDING"
        );
    }
}
