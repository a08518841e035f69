//! Merchant payment ledger and settlement engine.
//!
//! The core is a balance-reservation protocol on merchant accounts, a strict
//! transaction lifecycle (`Initiated -> Pending -> {Success, Failed}`,
//! `Success -> Settled`) and a settlement batcher that aggregates successful
//! transactions into payable batches.
//!
//! Layers:
//! - [`domain`]: value objects, entities and ports. Pure, no I/O.
//! - [`application`]: the [`application::engine::PaymentEngine`] facade and
//!   its command/query flows.
//! - [`infrastructure`]: in-memory stores and mock collaborators.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
