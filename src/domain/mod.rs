//! Domain layer: value objects, entities, lifecycle rules and the ports the
//! application layer drives them through.
//!
//! Entities are immutable snapshots; every mutator returns a new snapshot,
//! paired with the notification records it emitted. Nothing in this layer
//! performs I/O.

pub mod events;
pub mod fees;
pub mod merchant;
pub mod money;
pub mod ports;
pub mod settlement;
pub mod transaction;
