//! Application layer: the `PaymentEngine` facade and its command/query flows.
//!
//! Each flow lives in its own module as an `impl PaymentEngine` block:
//! transaction initiation, settlement batching, merchant on-boarding and the
//! transaction listing query. Handlers are resolved statically; there is no
//! runtime command routing.

pub mod engine;
pub mod initiation;
pub mod merchants;
pub mod queries;
pub mod settlement;
