use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paylock::application::engine::PaymentEngine;
use paylock::application::initiation::InitiateTransaction;
use paylock::application::merchants::CreateMerchant;
use paylock::application::settlement::SettleTransactions;
use paylock::infrastructure::in_memory::InMemoryStore;
use paylock::infrastructure::notifications::LoggingNotificationSink;
use paylock::infrastructure::transfer::MockTransferService;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Runs an end-to-end payment scenario against the in-memory ledger:
/// on-boards a merchant, initiates a number of payments through the mock
/// transfer network, then settles the successful ones into a batch.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Merchant opening balance
    #[arg(long, default_value = "1000.00")]
    balance: Decimal,

    /// Amount per payment
    #[arg(long, default_value = "100.00")]
    amount: Decimal,

    /// Payment currency code (NGN, USD, EUR, GBP)
    #[arg(long, default_value = "NGN")]
    currency: String,

    /// Number of payments to initiate
    #[arg(long, default_value_t = 3)]
    count: u32,

    /// Transfer outcome code the mock network answers with
    #[arg(long, default_value = "00")]
    outcome_code: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let store = InMemoryStore::new();
    let engine = PaymentEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(MockTransferService::with_code(cli.outcome_code)),
        Arc::new(LoggingNotificationSink),
    );

    let merchant = engine
        .create_merchant(CreateMerchant {
            business_name: "Demo Stores Ltd".to_string(),
            email: "payments@demo-stores.test".to_string(),
            settlement_account: "0011223344".to_string(),
            opening_balance: cli.balance,
        })
        .await
        .into_diagnostic()?;
    println!("{}", serde_json::to_string_pretty(&merchant).into_diagnostic()?);

    for i in 0..cli.count {
        let result = engine
            .initiate_transaction(InitiateTransaction {
                merchant_id: merchant.id,
                merchant_ref: format!("order-{i}"),
                amount: cli.amount,
                currency: cli.currency.clone(),
                idempotency_key: Uuid::new_v4().to_string(),
            })
            .await;
        match result {
            Ok(tx) => println!("{}", serde_json::to_string_pretty(&tx).into_diagnostic()?),
            Err(e) => eprintln!("payment {i} refused [{}]: {e}", e.code()),
        }
    }

    let summary = engine
        .settle_transactions(SettleTransactions {
            merchant_id: merchant.id,
            limit: 100,
        })
        .await
        .into_diagnostic()?;
    println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);

    Ok(())
}
