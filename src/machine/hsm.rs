//! The hierarchical machine and its event loop.

use crate::core::{
    Event, EventHandler, Node, Outcome, Signal, Slot, State, StateId, StateRef, TransitionHistory,
    TransitionRecord,
};
use crate::machine::builder::{HsmBuilder, HsmConfig, UnhandledHook};
use crate::machine::error::HsmError;
use crate::machine::producer::{EventProducer, EventQueue};
use crate::machine::sync::{BlockingLock, Lock};
use chrono::Utc;
use std::fmt;
use tracing::{debug, debug_span, trace, warn};
use uuid::Uuid;

/// A hierarchical state machine.
///
/// The machine is itself the root state: the state passed at construction
/// lives at [`StateId::ROOT`] and every other state hangs below it. It owns
/// the state arena, the shared context `C`, the pending event queue and the
/// active state.
///
/// Matching and settling are kept apart. Matching offers an event to the
/// active state, then to each ancestor, and stops at the first handler whose
/// mask intersects the signal. Settling applies the requested transition:
/// exit the current state, enter the target, and keep following targets
/// returned by `entry` until one returns `None` or itself.
///
/// # Example
///
/// ```rust
/// use hsm::core::{Event, State, StateId};
/// use hsm::Hsm;
///
/// const SIG_START: u32 = 1 << 0;
/// const SIG_STOP: u32 = 1 << 1;
///
/// #[derive(Default)]
/// struct Root {
///     initial: Option<StateId>,
/// }
///
/// impl State<Vec<String>> for Root {
///     fn name(&self) -> &str {
///         "Root"
///     }
///     fn entry(&mut self, _: &mut Vec<String>) -> Option<StateId> {
///         self.initial
///     }
///     fn exit(&mut self, _: &mut Vec<String>) {}
/// }
///
/// struct Mode(&'static str);
///
/// impl State<Vec<String>> for Mode {
///     fn name(&self) -> &str {
///         self.0
///     }
///     fn entry(&mut self, log: &mut Vec<String>) -> Option<StateId> {
///         log.push(format!("enter {}", self.0));
///         None
///     }
///     fn exit(&mut self, log: &mut Vec<String>) {
///         log.push(format!("exit {}", self.0));
///     }
/// }
///
/// # fn main() -> Result<(), hsm::HsmError> {
/// let mut hsm: Hsm<Vec<String>> = Hsm::new(Root::default(), Vec::new());
/// let idle = hsm.add_state(Mode("Idle"), StateId::ROOT)?;
/// let active = hsm.add_state(Mode("Active"), StateId::ROOT)?;
///
/// let to_active = active.id();
/// hsm.attach(idle, SIG_START, move |_, _, _| Some(to_active))?;
/// let to_idle = idle.id();
/// hsm.attach(active, SIG_STOP, move |_, _, _| Some(to_idle))?;
///
/// let root = hsm.root::<Root>()?;
/// hsm.state_mut(root)?.initial = Some(idle.id());
///
/// assert_eq!(hsm.init()?, idle.id());
///
/// hsm.raise_event(Event::new(SIG_START))?;
/// assert_eq!(hsm.dispatch_events()?, active.id());
/// assert_eq!(hsm.context().last().map(String::as_str), Some("enter Active"));
/// # Ok(())
/// # }
/// ```
pub struct Hsm<C, P = (), L = BlockingLock<EventQueue<P>>> {
    id: Uuid,
    states: Vec<Box<dyn Slot<C, P>>>,
    active: StateId,
    started: bool,
    context: C,
    producer: EventProducer<P, L>,
    history: TransitionHistory,
    max_settle_steps: Option<usize>,
    on_unhandled: Option<UnhandledHook<P>>,
}

impl<C: 'static, P: 'static> Hsm<C, P> {
    /// Create a machine with the default configuration and a blocking lock.
    pub fn new<R: State<C>>(root: R, context: C) -> Self {
        HsmBuilder::new().build(root, context)
    }
}

impl<C, P, L> Hsm<C, P, L>
where
    C: 'static,
    P: 'static,
    L: Lock<EventQueue<P>>,
{
    pub(crate) fn from_parts<R: State<C>>(
        root: R,
        context: C,
        config: HsmConfig,
        on_unhandled: Option<UnhandledHook<P>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let root: Box<dyn Slot<C, P>> = Box::new(Node::<R, C, P>::new(root, None));
        debug!(machine = %id, root = root.name(), "Machine created");

        Self {
            id,
            states: vec![root],
            active: StateId::ROOT,
            started: false,
            context,
            producer: EventProducer::new(id, config.queue_capacity),
            history: TransitionHistory::new(config.history_limit),
            max_settle_steps: config.max_settle_steps,
            on_unhandled,
        }
    }

    /// Unique id of this machine instance, used in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register a state below `parent`.
    ///
    /// The parent must already be registered, so the parent relation can
    /// never form a cycle.
    pub fn add_state<S: State<C>>(
        &mut self,
        state: S,
        parent: impl Into<StateId>,
    ) -> Result<StateRef<S>, HsmError> {
        let parent = parent.into();
        self.slot(parent)?;
        self.states.try_reserve(1)?;

        let id = StateId::new(self.states.len());
        let node = Node::<S, C, P>::new(state, Some(parent));
        debug!(
            machine = %self.id,
            state = %id,
            name = node.state().name(),
            parent = %parent,
            "State attached"
        );
        self.states.push(Box::new(node));
        Ok(StateRef::new(id))
    }

    /// Typed handle to the root state, if it is an `R`.
    pub fn root<R: State<C>>(&self) -> Result<StateRef<R>, HsmError> {
        self.node::<R>(StateId::ROOT)?;
        Ok(StateRef::new(StateId::ROOT))
    }

    /// Append an event handler to `state`.
    ///
    /// Handlers are tried in registration order and the first whose mask
    /// intersects the event's signal wins. Overlapping masks are allowed;
    /// the earlier registration shadows the later one for shared bits.
    pub fn attach<S, F>(
        &mut self,
        state: StateRef<S>,
        mask: Signal,
        transition: F,
    ) -> Result<(), HsmError>
    where
        S: State<C>,
        F: FnMut(&mut S, &Event<P>, &mut C) -> Option<StateId> + Send + 'static,
    {
        let machine = self.id;
        let id = state.id();
        let node = self.node_mut::<S>(id)?;

        if mask == 0 {
            warn!(machine = %machine, state = %id, "Handler with empty mask will never match");
        }
        if let Some(shadowing) = node.handlers().iter().find(|h| h.mask() & mask != 0) {
            debug!(
                machine = %machine,
                state = %id,
                mask,
                earlier = shadowing.mask(),
                "Handler mask overlaps an earlier handler"
            );
        }

        let handlers = node.handlers_mut();
        handlers.try_reserve(1)?;
        handlers.push(EventHandler::new(mask, transition));
        Ok(())
    }

    /// Shared access to a registered state.
    pub fn state<S: State<C>>(&self, state: StateRef<S>) -> Result<&S, HsmError> {
        Ok(self.node::<S>(state.id())?.state())
    }

    /// Exclusive access to a registered state.
    pub fn state_mut<S: State<C>>(&mut self, state: StateRef<S>) -> Result<&mut S, HsmError> {
        Ok(self.node_mut::<S>(state.id())?.state_mut())
    }

    /// Enqueue an event for the next [`dispatch_events`](Self::dispatch_events).
    pub fn raise_event(&self, event: Event<P>) -> Result<(), HsmError> {
        self.producer.raise(event)
    }

    /// Handle for raising events from other execution contexts.
    pub fn producer(&self) -> EventProducer<P, L> {
        self.producer.clone()
    }

    /// Enter the root state and settle.
    ///
    /// Runs the root's `entry`, follows the chain of entry-requested
    /// transitions and makes the settled state active. May only be called
    /// once.
    ///
    /// A failed settle still starts the machine. The active state is the
    /// last one whose `entry` ran, as after a failed step in
    /// [`dispatch_events`](Self::dispatch_events), and a second call
    /// returns [`HsmError::AlreadyStarted`].
    pub fn init(&mut self) -> Result<StateId, HsmError> {
        if self.started {
            return Err(HsmError::AlreadyStarted);
        }
        let _span = debug_span!("hsm_init", machine = %self.id).entered();

        self.active = StateId::ROOT;
        self.started = true;
        let next = self.states[StateId::ROOT.index()].entry(&mut self.context);
        let settled = match self.settle(StateId::ROOT, next, None, true) {
            Ok(settled) => settled,
            Err(err) => {
                warn!(active = %self.active, error = %err, "Machine started on a partial settle");
                return Err(err);
            }
        };

        debug!(active = %settled, name = self.states[settled.index()].name(), "Machine started");
        Ok(settled)
    }

    /// Dispatch a single event against `state` without touching the queue.
    ///
    /// With `None` this performs entry processing from `state`: `entry` is
    /// called and the chain of entry-requested transitions is followed, and
    /// the settled state is returned.
    ///
    /// The active state is never changed, so running `exit` and `entry`
    /// hooks on states other than the active one leaves the hooks and
    /// [`active`](Self::active) out of step. Use it for inspection and
    /// tests; [`init`](Self::init) and
    /// [`dispatch_events`](Self::dispatch_events) keep both in sync.
    ///
    /// With an event, the handlers of `state` are tried in registration
    /// order, then those of each ancestor. The first match decides: `None`
    /// means handled in place, `Some(target)` requests a transition. An
    /// event matched nowhere returns `None`.
    pub fn dispatch(
        &mut self,
        state: StateId,
        event: Option<&Event<P>>,
    ) -> Result<Option<StateId>, HsmError> {
        match event {
            None => {
                let slot = self
                    .states
                    .get_mut(state.index())
                    .ok_or(HsmError::UnknownState(state))?;
                let next = slot.entry(&mut self.context);
                self.settle(state, next, None, false).map(Some)
            }
            Some(event) => self.match_event(state, event),
        }
    }

    /// Drain the queue.
    ///
    /// Events are taken in FIFO order and dispatched against the active
    /// state; any transition is settled before the next event is taken.
    /// Events raised while draining are processed by the same call. Returns
    /// immediately with the active state when the queue is empty.
    ///
    /// An event is removed from the queue before it is dispatched, so while
    /// its handler runs [`pending`](Self::pending) no longer counts it and
    /// its slot under a queue capacity is already free. If dispatching
    /// fails, that event is dropped, the error is returned and later events
    /// stay queued. The active state is the last one whose `entry` ran.
    pub fn dispatch_events(&mut self) -> Result<StateId, HsmError> {
        if !self.started {
            return Err(HsmError::NotStarted);
        }
        let _span = debug_span!("hsm_dispatch", machine = %self.id).entered();

        let mut processed = 0usize;
        while let Some(event) = self.producer.pop() {
            let signal = event.signal();
            trace!(signal, active = %self.active, "Dispatching event");

            let next = self.match_event(self.active, &event)?;
            if next.is_some() {
                self.settle(self.active, next, Some(signal), true)?;
            }
            processed += 1;
        }

        if processed > 0 {
            trace!(processed, active = %self.active, "Queue drained");
        }
        Ok(self.active)
    }

    /// Offer an event up the parent chain starting at `from`.
    fn match_event(&mut self, from: StateId, event: &Event<P>) -> Result<Option<StateId>, HsmError> {
        let mut current = Some(from);
        while let Some(id) = current {
            let slot = self
                .states
                .get_mut(id.index())
                .ok_or(HsmError::UnknownState(id))?;
            match slot.handle(event, &mut self.context) {
                Outcome::Handled(next) => {
                    trace!(signal = event.signal(), state = %id, next = ?next, "Event handled");
                    if let Some(target) = next {
                        self.slot(target)?;
                    }
                    return Ok(next);
                }
                Outcome::Unmatched => current = slot.parent(),
            }
        }

        trace!(signal = event.signal(), state = %from, "Event unhandled");
        if let Some(hook) = self.on_unhandled.as_mut() {
            hook(event, from);
        }
        Ok(None)
    }

    /// Exit `from` and enter targets until the chain stops.
    ///
    /// The chain stops when a target is `None` or the state just entered.
    /// With `track_active` the active state follows every step.
    fn settle(
        &mut self,
        from: StateId,
        mut next: Option<StateId>,
        signal: Option<Signal>,
        track_active: bool,
    ) -> Result<StateId, HsmError> {
        let mut current = from;
        let mut steps = 0usize;

        while let Some(target) = next.filter(|t| *t != current) {
            if target.index() >= self.states.len() {
                warn!(from = %current, to = %target, "Transition to unregistered state");
                return Err(HsmError::UnknownState(target));
            }
            if let Some(limit) = self.max_settle_steps {
                if steps == limit {
                    return Err(HsmError::SettleLimitExceeded { from, limit });
                }
            }
            steps += 1;

            self.states[current.index()].exit(&mut self.context);
            debug!(
                from = self.states[current.index()].name(),
                to = self.states[target.index()].name(),
                signal = ?signal,
                "Transition"
            );
            self.history.record(TransitionRecord {
                from: current,
                to: target,
                signal,
                timestamp: Utc::now(),
            });

            current = target;
            if track_active {
                self.active = current;
            }
            next = self.states[current.index()].entry(&mut self.context);
        }

        Ok(current)
    }

    /// The state events are currently dispatched against.
    pub fn active(&self) -> StateId {
        self.active
    }

    /// True if `state` is the active state or one of its ancestors.
    pub fn is_in(&self, state: StateId) -> bool {
        let mut current = Some(self.active);
        while let Some(id) = current {
            if id == state {
                return true;
            }
            current = self.states.get(id.index()).and_then(|s| s.parent());
        }
        false
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.producer.pending()
    }

    pub fn state_name(&self, state: StateId) -> Option<&str> {
        self.states.get(state.index()).map(|s| s.name())
    }

    pub fn parent_of(&self, state: StateId) -> Result<Option<StateId>, HsmError> {
        Ok(self.slot(state)?.parent())
    }

    pub fn handler_count(&self, state: StateId) -> Result<usize, HsmError> {
        Ok(self.slot(state)?.handler_count())
    }

    /// Every registered state with its name, in registration order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &str)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(index, slot)| (StateId::new(index), slot.name()))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    fn slot(&self, id: StateId) -> Result<&dyn Slot<C, P>, HsmError> {
        self.states
            .get(id.index())
            .map(|slot| &**slot)
            .ok_or(HsmError::UnknownState(id))
    }

    fn slot_mut(&mut self, id: StateId) -> Result<&mut Box<dyn Slot<C, P>>, HsmError> {
        self.states
            .get_mut(id.index())
            .ok_or(HsmError::UnknownState(id))
    }

    fn node<S: State<C>>(&self, id: StateId) -> Result<&Node<S, C, P>, HsmError> {
        self.slot(id)?
            .as_any()
            .downcast_ref::<Node<S, C, P>>()
            .ok_or(HsmError::StateTypeMismatch {
                id,
                expected: std::any::type_name::<S>(),
            })
    }

    fn node_mut<S: State<C>>(&mut self, id: StateId) -> Result<&mut Node<S, C, P>, HsmError> {
        self.slot_mut(id)?
            .as_any_mut()
            .downcast_mut::<Node<S, C, P>>()
            .ok_or(HsmError::StateTypeMismatch {
                id,
                expected: std::any::type_name::<S>(),
            })
    }
}

impl<C, P, L> fmt::Debug for Hsm<C, P, L>
where
    C: 'static,
    P: 'static,
    L: Lock<EventQueue<P>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hsm")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("started", &self.started)
            .field("states", &self.states.len())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
