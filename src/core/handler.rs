//! Event handlers binding a signal mask to a transition.

use super::event::{Event, Signal};
use super::state::StateId;

/// Transition bound to a handler.
///
/// Receives the owning state, the event being dispatched and the machine
/// context. Returns `None` when the event is handled without a transition,
/// or the state to move to.
pub type TransitionFn<S, C, P> =
    Box<dyn FnMut(&mut S, &Event<P>, &mut C) -> Option<StateId> + Send>;

/// Binds one signal mask to one transition.
///
/// Matching is a bitmask intersection, not equality: a handler whose mask
/// has several bits set matches every event sharing at least one of them.
///
/// # Example
///
/// ```rust
/// use hsm::core::{Event, EventHandler, StateId};
///
/// struct Door;
///
/// let mut handler: EventHandler<Door, ()> =
///     EventHandler::new(0b0110, |_door, _event, _ctx| None);
///
/// assert!(handler.matches(&Event::new(0b0010)));
/// assert!(handler.matches(&Event::new(0b0100)));
/// assert!(!handler.matches(&Event::new(0b1001)));
///
/// // Re-attaching replaces the previous binding.
/// handler.attach(0b1000, |_door, _event, _ctx| Some(StateId::ROOT));
/// assert!(handler.matches(&Event::new(0b1000)));
/// assert!(!handler.matches(&Event::new(0b0010)));
/// assert_eq!(handler.dispatch(&mut Door, &Event::new(0b1000), &mut ()), Some(StateId::ROOT));
/// ```
pub struct EventHandler<S, C, P = ()> {
    mask: Signal,
    transition: TransitionFn<S, C, P>,
}

impl<S, C, P> EventHandler<S, C, P> {
    pub fn new<F>(mask: Signal, transition: F) -> Self
    where
        F: FnMut(&mut S, &Event<P>, &mut C) -> Option<StateId> + Send + 'static,
    {
        Self {
            mask,
            transition: Box::new(transition),
        }
    }

    /// Rebind this handler. The previous mask and transition are discarded.
    pub fn attach<F>(&mut self, mask: Signal, transition: F)
    where
        F: FnMut(&mut S, &Event<P>, &mut C) -> Option<StateId> + Send + 'static,
    {
        self.mask = mask;
        self.transition = Box::new(transition);
    }

    pub fn mask(&self) -> Signal {
        self.mask
    }

    /// True iff the event's signal shares at least one bit with the mask.
    pub fn matches(&self, event: &Event<P>) -> bool {
        event.signal() & self.mask != 0
    }

    /// Invoke the bound transition.
    pub fn dispatch(&mut self, state: &mut S, event: &Event<P>, ctx: &mut C) -> Option<StateId> {
        (self.transition)(state, event, ctx)
    }
}

impl<S, C, P> std::fmt::Debug for EventHandler<S, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("mask", &format_args!("{:#x}", self.mask))
            .finish_non_exhaustive()
    }
}
