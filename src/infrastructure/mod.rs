//! Reference implementations of the domain ports: in-memory stores, a mock
//! transfer collaborator and notification sinks.

pub mod in_memory;
pub mod notifications;
pub mod transfer;
