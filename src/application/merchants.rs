use crate::application::engine::PaymentEngine;
use crate::domain::merchant::{Merchant, MerchantStatus};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Command to on-board a merchant.
#[derive(Debug, Clone)]
pub struct CreateMerchant {
    pub business_name: String,
    pub email: String,
    pub settlement_account: String,
    pub opening_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantResult {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub settlement_account: String,
    pub balance: Decimal,
    pub locked_balance: Decimal,
    pub status: MerchantStatus,
    pub created_at: DateTime<Utc>,
}

impl MerchantResult {
    fn from_merchant(merchant: &Merchant) -> Self {
        Self {
            id: merchant.id,
            business_name: merchant.business_name.clone(),
            email: merchant.email.clone(),
            settlement_account: merchant.settlement_account.clone(),
            balance: merchant.balance,
            locked_balance: merchant.locked_balance,
            status: merchant.status,
            created_at: merchant.created_at,
        }
    }
}

impl PaymentEngine {
    /// Creates a merchant. Emails are unique across merchants.
    pub async fn create_merchant(&self, command: CreateMerchant) -> Result<MerchantResult> {
        if self.merchants.exists_by_email(&command.email).await? {
            return Err(PaymentError::Conflict(format!(
                "Merchant with email {} already exists",
                command.email
            )));
        }

        let (merchant, event) = Merchant::create(
            command.business_name,
            command.email,
            command.settlement_account,
            command.opening_balance,
        )?;
        let saved = self.merchants.save(merchant).await?;
        info!(merchant_id = %saved.id, "merchant created");
        self.publish(event).await;

        Ok(MerchantResult::from_merchant(&saved))
    }

    pub async fn find_merchant(&self, merchant_id: Uuid) -> Result<Merchant> {
        self.merchants
            .find_by_id(merchant_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Merchant {merchant_id}")))
    }

    /// Reactivates a suspended merchant and clears the failed-attempt
    /// counter, re-arming the circuit breaker.
    pub async fn activate_merchant(&self, merchant_id: Uuid) -> Result<MerchantResult> {
        let merchant = self.find_merchant(merchant_id).await?;
        let reactivated = merchant.activate()?.reset_failed_attempts();
        let saved = self
            .merchants
            .update_guarded(reactivated, merchant.balance, merchant.locked_balance)
            .await?;
        info!(merchant_id = %saved.id, "merchant reactivated");
        Ok(MerchantResult::from_merchant(&saved))
    }
}
