//! The machine: state arena, event queue and run loop.
//!
//! This module provides the runtime around the core types:
//! - [`Hsm`], the root state that owns every other state and drives
//!   entry/exit transitions from queued events
//! - [`HsmBuilder`] for configuring a machine before it is built
//! - [`EventProducer`] for raising events from other execution contexts
//! - the [`Lock`] abstraction guarding the event queue

pub mod builder;
pub mod error;
pub mod hsm;
pub mod macros;
pub mod producer;
pub mod sync;

pub use builder::{HsmBuilder, HsmConfig, UnhandledHook, DEFAULT_HISTORY_LIMIT};
pub use error::HsmError;
pub use hsm::Hsm;
pub use producer::{EventProducer, EventQueue};
pub use sync::{BlockingLock, Lock, NoopLock};
