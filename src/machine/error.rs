//! Errors raised while configuring or running a machine.

use crate::core::StateId;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that can occur when building or driving a hierarchical machine.
///
/// An event that no state handles is not an error; it is dropped.
#[derive(Debug, Error)]
pub enum HsmError {
    #[error("State {0} is not registered with this machine")]
    UnknownState(StateId),

    #[error("State {id} is not of type {expected}")]
    StateTypeMismatch { id: StateId, expected: &'static str },

    #[error("Machine not started. Call .init() before dispatching events")]
    NotStarted,

    #[error("Machine already started. .init() may only be called once")]
    AlreadyStarted,

    #[error("Event queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("Entry chain from {from} did not settle within {limit} steps")]
    SettleLimitExceeded { from: StateId, limit: usize },
}
