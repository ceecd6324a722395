//! Hsm: a hierarchical state machine runtime
//!
//! Hsm targets control software where an explicit state machine replaces
//! ad-hoc conditional logic. States form a tree: an event a state does not
//! handle is retried by its parent, up to the root.
//!
//! # Core Concepts
//!
//! - **State**: Application states implement the `State` trait (`entry` and
//!   `exit` hooks) and live in the machine's arena, addressed by `StateId`
//! - **Events**: A `u32` signal plus an optional payload
//! - **Handlers**: Closures attached to a state under a signal mask; the first
//!   handler whose mask intersects the event's signal wins
//! - **Settling**: A transition exits the current state and enters the
//!   target; `entry` may request a further transition, followed until stable
//! - **Queue**: Producers raise events, possibly from other threads; the
//!   consumer drains them in FIFO order with `dispatch_events`
//!
//! # Example
//!
//! ```rust
//! use hsm::core::{Event, State, StateId};
//! use hsm::{signals, Hsm};
//!
//! signals! {
//!     SIG_COIN,
//!     SIG_PUSH,
//! }
//!
//! struct Turnstile {
//!     locked: Option<StateId>,
//! }
//!
//! impl State<u32> for Turnstile {
//!     fn entry(&mut self, _: &mut u32) -> Option<StateId> {
//!         self.locked
//!     }
//!     fn exit(&mut self, _: &mut u32) {}
//! }
//!
//! struct Gate(&'static str);
//!
//! impl State<u32> for Gate {
//!     fn name(&self) -> &str {
//!         self.0
//!     }
//!     fn entry(&mut self, _: &mut u32) -> Option<StateId> {
//!         None
//!     }
//!     fn exit(&mut self, _: &mut u32) {}
//! }
//!
//! # fn main() -> Result<(), hsm::HsmError> {
//! let mut hsm: Hsm<u32> = Hsm::new(Turnstile { locked: None }, 0);
//! let locked = hsm.add_state(Gate("Locked"), StateId::ROOT)?;
//! let unlocked = hsm.add_state(Gate("Unlocked"), StateId::ROOT)?;
//!
//! let (to_locked, to_unlocked) = (locked.id(), unlocked.id());
//! hsm.attach(locked, SIG_COIN, move |_, _, coins| {
//!     *coins += 1;
//!     Some(to_unlocked)
//! })?;
//! hsm.attach(unlocked, SIG_PUSH, move |_, _, _| Some(to_locked))?;
//!
//! let root = hsm.root::<Turnstile>()?;
//! hsm.state_mut(root)?.locked = Some(locked.id());
//! hsm.init()?;
//!
//! hsm.raise_event(Event::new(SIG_COIN))?;
//! hsm.raise_event(Event::new(SIG_PUSH))?;
//! assert_eq!(hsm.dispatch_events()?, locked.id());
//! assert_eq!(*hsm.context(), 1);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod machine;

// Re-export commonly used types
pub use core::{Event, EventHandler, Signal, State, StateId, StateRef, NO_SIGNAL, USER_SIG};
pub use machine::{EventProducer, Hsm, HsmBuilder, HsmConfig, HsmError};
