//! Core hierarchical state machine types.
//!
//! This module contains the building blocks the machine is made of:
//! - Events and signals
//! - Event handlers matching signals by bitmask
//! - The `State` trait and state identifiers
//! - Bounded transition history

mod event;
mod handler;
mod history;
mod state;

pub use event::{Event, Signal, NO_SIGNAL, USER_SIG};
pub use handler::{EventHandler, TransitionFn};
pub use history::{TransitionHistory, TransitionRecord};
pub use state::{State, StateId, StateRef};

pub(crate) use state::{Node, Outcome, Slot};
