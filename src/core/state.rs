//! The `State` capability and the arena node that carries it.
//!
//! Concrete states implement [`State`]. Once registered with a machine a
//! state lives in an arena slot addressed by [`StateId`]; the slot also holds
//! the state's parent index and its ordered handler list.

use super::event::Event;
use super::handler::EventHandler;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Index of a state inside a machine's arena.
///
/// `StateId::ROOT` always names the machine's root state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    /// The root state of every machine.
    pub const ROOT: StateId = StateId(0);

    pub(crate) fn new(index: usize) -> Self {
        StateId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed handle to a registered state.
///
/// Returned by [`Hsm::add_state`](crate::Hsm::add_state). It remembers the
/// concrete state type so handlers can be attached with direct access to
/// that type.
pub struct StateRef<S> {
    id: StateId,
    _phantom: PhantomData<fn() -> S>,
}

impl<S> StateRef<S> {
    pub(crate) fn new(id: StateId) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }
}

impl<S> Clone for StateRef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for StateRef<S> {}

impl<S> fmt::Debug for StateRef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateRef").field(&self.id).finish()
    }
}

impl<S> PartialEq for StateRef<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for StateRef<S> {}

impl<S> From<StateRef<S>> for StateId {
    fn from(state: StateRef<S>) -> Self {
        state.id
    }
}

/// Trait for hierarchical machine states.
///
/// `C` is the context shared by every state of one machine. It is owned by
/// the machine and lent to each hook.
///
/// # Example
///
/// ```rust
/// use hsm::core::{State, StateId};
///
/// struct Heating {
///     setpoint: f32,
/// }
///
/// impl State<Vec<String>> for Heating {
///     fn name(&self) -> &str {
///         "Heating"
///     }
///
///     fn entry(&mut self, log: &mut Vec<String>) -> Option<StateId> {
///         log.push(format!("heating to {}", self.setpoint));
///         None
///     }
///
///     fn exit(&mut self, log: &mut Vec<String>) {
///         log.push("heater off".to_string());
///     }
/// }
/// ```
pub trait State<C>: Send + 'static {
    /// Get the state's name for display/logging.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called when the state becomes active.
    ///
    /// Returning `Some(next)` requests an immediate transition to `next`
    /// (chained entry). Returning `None`, or this state's own id, settles.
    fn entry(&mut self, ctx: &mut C) -> Option<StateId>;

    /// Called exactly once immediately before the state is left.
    fn exit(&mut self, ctx: &mut C);
}

/// Result of offering an event to a single state's handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// No handler mask intersects the event's signal.
    Unmatched,
    /// A handler ran; carries the transition it requested, if any.
    Handled(Option<StateId>),
}

/// Arena slot: a concrete state, its parent and its handlers.
pub(crate) struct Node<S, C, P> {
    state: S,
    parent: Option<StateId>,
    handlers: Vec<EventHandler<S, C, P>>,
}

impl<S, C, P> Node<S, C, P> {
    pub(crate) fn new(state: S, parent: Option<StateId>) -> Self {
        Self {
            state,
            parent,
            handlers: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> &S {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub(crate) fn handlers_mut(&mut self) -> &mut Vec<EventHandler<S, C, P>> {
        &mut self.handlers
    }

    pub(crate) fn handlers(&self) -> &[EventHandler<S, C, P>] {
        &self.handlers
    }
}

/// Type-erased view of a [`Node`] used by the machine.
pub(crate) trait Slot<C, P>: Send {
    fn name(&self) -> &str;
    fn parent(&self) -> Option<StateId>;
    fn entry(&mut self, ctx: &mut C) -> Option<StateId>;
    fn exit(&mut self, ctx: &mut C);
    /// Offer the event to this slot's handlers in registration order.
    fn handle(&mut self, event: &Event<P>, ctx: &mut C) -> Outcome;
    fn handler_count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S, C, P> Slot<C, P> for Node<S, C, P>
where
    S: State<C>,
    C: 'static,
    P: 'static,
{
    fn name(&self) -> &str {
        self.state.name()
    }

    fn parent(&self) -> Option<StateId> {
        self.parent
    }

    fn entry(&mut self, ctx: &mut C) -> Option<StateId> {
        self.state.entry(ctx)
    }

    fn exit(&mut self, ctx: &mut C) {
        self.state.exit(ctx)
    }

    fn handle(&mut self, event: &Event<P>, ctx: &mut C) -> Outcome {
        match self.handlers.iter_mut().find(|h| h.matches(event)) {
            Some(handler) => Outcome::Handled(handler.dispatch(&mut self.state, event, ctx)),
            None => Outcome::Unmatched,
        }
    }

    fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lamp {
        lit: bool,
        next: Option<StateId>,
    }

    impl State<Vec<&'static str>> for Lamp {
        fn name(&self) -> &str {
            "Lamp"
        }

        fn entry(&mut self, log: &mut Vec<&'static str>) -> Option<StateId> {
            self.lit = true;
            log.push("entry");
            self.next
        }

        fn exit(&mut self, log: &mut Vec<&'static str>) {
            self.lit = false;
            log.push("exit");
        }
    }

    type LampNode = Node<Lamp, Vec<&'static str>, ()>;

    fn lamp() -> LampNode {
        Node::new(
            Lamp {
                lit: false,
                next: None,
            },
            Some(StateId::ROOT),
        )
    }

    #[test]
    fn state_id_displays_index() {
        assert_eq!(StateId::new(3).to_string(), "#3");
        assert_eq!(StateId::ROOT.index(), 0);
    }

    #[test]
    fn state_ref_converts_to_id() {
        let state: StateRef<Lamp> = StateRef::new(StateId::new(2));
        let copy = state;
        assert_eq!(StateId::from(state), StateId::new(2));
        assert_eq!(copy, state);
    }

    #[test]
    fn state_id_serializes_correctly() {
        let json = serde_json::to_string(&StateId::new(5)).unwrap();
        let deserialized: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, StateId::new(5));
    }

    #[test]
    fn default_name_is_type_name() {
        struct Unnamed;
        impl State<()> for Unnamed {
            fn entry(&mut self, _: &mut ()) -> Option<StateId> {
                None
            }
            fn exit(&mut self, _: &mut ()) {}
        }

        assert!(Unnamed.name().ends_with("Unnamed"));
    }

    #[test]
    fn slot_forwards_hooks() {
        let mut node = lamp();
        let mut log = Vec::new();

        assert_eq!(Slot::<_, ()>::entry(&mut node, &mut log), None);
        assert!(node.state().lit);
        Slot::<_, ()>::exit(&mut node, &mut log);
        assert!(!node.state().lit);
        assert_eq!(log, vec!["entry", "exit"]);
        assert_eq!(Slot::<_, ()>::name(&node), "Lamp");
        assert_eq!(Slot::<_, ()>::parent(&node), Some(StateId::ROOT));
    }

    #[test]
    fn unmatched_without_handlers() {
        let mut node = lamp();
        let outcome = node.handle(&Event::new(1), &mut Vec::new());
        assert_eq!(outcome, Outcome::Unmatched);
    }

    #[test]
    fn first_registered_handler_wins() {
        let mut node = lamp();
        node.handlers_mut()
            .push(EventHandler::new(0b011, |_, _, _| Some(StateId::new(1))));
        node.handlers_mut()
            .push(EventHandler::new(0b110, |_, _, _| Some(StateId::new(2))));

        let mut log = Vec::new();
        assert_eq!(
            node.handle(&Event::new(0b010), &mut log),
            Outcome::Handled(Some(StateId::new(1)))
        );
        assert_eq!(
            node.handle(&Event::new(0b100), &mut log),
            Outcome::Handled(Some(StateId::new(2)))
        );
        assert_eq!(node.handle(&Event::new(0b1000), &mut log), Outcome::Unmatched);
        assert_eq!(node.handler_count(), 2);
    }

    #[test]
    fn handled_without_transition() {
        let mut node = lamp();
        node.handlers_mut().push(EventHandler::new(1, |lamp: &mut Lamp, _, _| {
            lamp.lit = !lamp.lit;
            None
        }));

        let outcome = node.handle(&Event::new(1), &mut Vec::new());

        assert_eq!(outcome, Outcome::Handled(None));
        assert!(node.state().lit);
    }

    #[test]
    fn downcast_recovers_concrete_node() {
        let node = lamp();
        let slot: Box<dyn Slot<Vec<&'static str>, ()>> = Box::new(node);
        assert!(slot.as_any().downcast_ref::<LampNode>().is_some());
        assert!(slot
            .as_any()
            .downcast_ref::<Node<Lamp, Vec<&'static str>, u8>>()
            .is_none());
    }
}
