//! Property-based tests for matching, delegation and queue ordering.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use hsm::core::{Event, Signal, State, StateId};
use hsm::Hsm;
use proptest::prelude::*;

/// Context recording which handler saw which signal.
#[derive(Default)]
struct Seen {
    handled: Vec<(usize, Signal)>,
}

struct Root {
    initial: Option<StateId>,
}

impl State<Seen> for Root {
    fn entry(&mut self, _: &mut Seen) -> Option<StateId> {
        self.initial
    }

    fn exit(&mut self, _: &mut Seen) {}
}

struct Plain;

impl State<Seen> for Plain {
    fn entry(&mut self, _: &mut Seen) -> Option<StateId> {
        None
    }

    fn exit(&mut self, _: &mut Seen) {}
}

fn started_on(hsm: &mut Hsm<Seen>, initial: StateId) {
    let root = hsm.root::<Root>().unwrap();
    hsm.state_mut(root).unwrap().initial = Some(initial);
    hsm.init().unwrap();
}

prop_compose! {
    fn non_zero_mask()(mask in 1..=u32::MAX) -> Signal {
        mask
    }
}

proptest! {
    #[test]
    fn first_registered_overlapping_handler_wins(
        m1 in non_zero_mask(),
        m2 in non_zero_mask(),
        signal in any::<u32>(),
    ) {
        let mut hsm: Hsm<Seen> = Hsm::new(Root { initial: None }, Seen::default());
        let leaf = hsm.add_state(Plain, StateId::ROOT).unwrap();
        hsm.attach(leaf, m1, |_, e, seen: &mut Seen| {
            seen.handled.push((1, e.signal()));
            None
        }).unwrap();
        hsm.attach(leaf, m2, |_, e, seen: &mut Seen| {
            seen.handled.push((2, e.signal()));
            None
        }).unwrap();
        started_on(&mut hsm, leaf.id());

        hsm.raise_event(Event::new(signal)).unwrap();
        hsm.dispatch_events().unwrap();

        let expected: Vec<(usize, Signal)> = if signal & m1 != 0 {
            vec![(1, signal)]
        } else if signal & m2 != 0 {
            vec![(2, signal)]
        } else {
            vec![]
        };
        prop_assert_eq!(&hsm.context().handled, &expected);
        prop_assert_eq!(hsm.active(), leaf.id());
    }

    #[test]
    fn events_are_dispatched_in_fifo_order(
        signals in prop::collection::vec(1..=u32::MAX, 0..40)
    ) {
        let mut hsm: Hsm<Seen> = Hsm::new(Root { initial: None }, Seen::default());
        let leaf = hsm.add_state(Plain, StateId::ROOT).unwrap();
        hsm.attach(leaf, u32::MAX, |_, e, seen: &mut Seen| {
            seen.handled.push((0, e.signal()));
            None
        }).unwrap();
        started_on(&mut hsm, leaf.id());

        for signal in &signals {
            hsm.raise_event(Event::new(*signal)).unwrap();
        }
        hsm.dispatch_events().unwrap();

        let dispatched: Vec<Signal> = hsm.context().handled.iter().map(|(_, s)| *s).collect();
        prop_assert_eq!(dispatched, signals);
        prop_assert_eq!(hsm.pending(), 0);
    }

    #[test]
    fn unmatched_events_bubble_to_the_nearest_matching_ancestor(
        depth in 1usize..6,
        handler_level in 0usize..6,
        signal in non_zero_mask(),
    ) {
        // Chain ROOT <- s1 <- ... <- s_depth with at most one handler, at
        // `handler_level` (0 = root). Levels past the leaf get no handler
        // and the event is dropped.
        let mut hsm: Hsm<Seen> = Hsm::new(Root { initial: None }, Seen::default());
        let mut chain = Vec::new();
        let mut parent = StateId::ROOT;
        for _ in 0..depth {
            let state = hsm.add_state(Plain, parent).unwrap();
            chain.push(state);
            parent = state.id();
        }
        let leaf = parent;

        if handler_level == 0 {
            let root = hsm.root::<Root>().unwrap();
            hsm.attach(root, signal, |_, e, seen: &mut Seen| {
                seen.handled.push((0, e.signal()));
                None
            }).unwrap();
        } else if handler_level <= depth {
            let level = handler_level;
            hsm.attach(chain[level - 1], signal, move |_, e, seen: &mut Seen| {
                seen.handled.push((level, e.signal()));
                None
            }).unwrap();
        }
        started_on(&mut hsm, leaf);

        hsm.raise_event(Event::new(signal)).unwrap();
        prop_assert_eq!(hsm.dispatch_events().unwrap(), leaf);

        if handler_level <= depth {
            prop_assert_eq!(&hsm.context().handled, &vec![(handler_level, signal)]);
        } else {
            prop_assert!(hsm.context().handled.is_empty());
        }
    }

    #[test]
    fn dispatch_only_returns_targets_handed_out_by_handlers(
        targets in prop::collection::vec(0usize..4, 4),
        signal in non_zero_mask(),
    ) {
        // Four sibling states; state i's handler (mask u32::MAX) requests
        // a transition to sibling targets[i].
        let mut hsm: Hsm<Seen> = Hsm::new(Root { initial: None }, Seen::default());
        let siblings: Vec<_> = (0..4)
            .map(|_| hsm.add_state(Plain, StateId::ROOT).unwrap())
            .collect();
        for (i, sibling) in siblings.iter().enumerate() {
            let target = siblings[targets[i]].id();
            hsm.attach(*sibling, u32::MAX, move |_, _, _| Some(target)).unwrap();
        }

        for (i, sibling) in siblings.iter().enumerate() {
            let next = hsm.dispatch(sibling.id(), Some(&Event::new(signal))).unwrap();
            prop_assert_eq!(next, Some(siblings[targets[i]].id()));
        }
        prop_assert_eq!(hsm.dispatch(StateId::ROOT, Some(&Event::new(signal))).unwrap(), None);
    }

    #[test]
    fn draining_an_empty_queue_changes_nothing(repeats in 1usize..5) {
        let mut hsm: Hsm<Seen> = Hsm::new(Root { initial: None }, Seen::default());
        let leaf = hsm.add_state(Plain, StateId::ROOT).unwrap();
        started_on(&mut hsm, leaf.id());
        let history = hsm.history().len();

        for _ in 0..repeats {
            prop_assert_eq!(hsm.dispatch_events().unwrap(), leaf.id());
        }
        prop_assert_eq!(hsm.history().len(), history);
    }
}
