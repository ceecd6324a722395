//! Configuration for hierarchical machines.

use crate::core::{Event, State, StateId};
use crate::machine::hsm::Hsm;
use crate::machine::producer::EventQueue;
use crate::machine::sync::Lock;

/// Observer invoked for events that no state in the active chain handles.
pub type UnhandledHook<P> = Box<dyn FnMut(&Event<P>, StateId) + Send>;

/// Default number of transition records kept by a machine.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Tunables applied when a machine is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HsmConfig {
    /// Maximum number of pending events. `None` means unbounded.
    pub queue_capacity: Option<usize>,

    /// Number of transition records kept. Zero disables the history.
    pub history_limit: usize,

    /// Maximum exit/entry steps one settle may take. `None` means no limit.
    pub max_settle_steps: Option<usize>,
}

impl Default for HsmConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_settle_steps: None,
        }
    }
}

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use hsm::core::{State, StateId};
/// use hsm::HsmBuilder;
///
/// struct Root;
///
/// impl State<u32> for Root {
///     fn entry(&mut self, _: &mut u32) -> Option<StateId> {
///         None
///     }
///     fn exit(&mut self, _: &mut u32) {}
/// }
///
/// let hsm = HsmBuilder::<()>::new()
///     .queue_capacity(16)
///     .history_limit(8)
///     .max_settle_steps(32)
///     .on_unhandled(|event, state| eprintln!("dropped {:#x} in {state}", event.signal()))
///     .build(Root, 0u32);
///
/// assert!(!hsm.is_started());
/// ```
pub struct HsmBuilder<P = ()> {
    config: HsmConfig,
    on_unhandled: Option<UnhandledHook<P>>,
}

impl<P: 'static> HsmBuilder<P> {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: HsmConfig::default(),
            on_unhandled: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: HsmConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound the number of pending events.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Set how many transition records are kept.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Fail a settle that takes more than `steps` exit/entry steps.
    pub fn max_settle_steps(mut self, steps: usize) -> Self {
        self.config.max_settle_steps = Some(steps);
        self
    }

    /// Observe events dropped at the top of the parent chain.
    ///
    /// Without a hook unhandled events are dropped silently.
    pub fn on_unhandled<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Event<P>, StateId) + Send + 'static,
    {
        self.on_unhandled = Some(Box::new(hook));
        self
    }

    /// Build a machine whose queue is guarded by a
    /// [`BlockingLock`](crate::machine::sync::BlockingLock).
    pub fn build<C, R>(self, root: R, context: C) -> Hsm<C, P>
    where
        C: 'static,
        R: State<C>,
    {
        self.build_with_lock(root, context)
    }

    /// Build a machine whose queue is guarded by the lock type `L`.
    pub fn build_with_lock<C, R, L>(self, root: R, context: C) -> Hsm<C, P, L>
    where
        C: 'static,
        R: State<C>,
        L: Lock<EventQueue<P>>,
    {
        Hsm::from_parts(root, context, self.config, self.on_unhandled)
    }
}

impl<P: 'static> Default for HsmBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
