//! Producer-side handle onto a machine's event queue.

use crate::core::Event;
use crate::machine::error::HsmError;
use crate::machine::sync::{BlockingLock, Lock};
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// FIFO of pending events shared between producers and the consumer.
pub type EventQueue<P> = VecDeque<Event<P>>;

/// Cloneable handle that enqueues events for a machine.
///
/// Producers never touch the active state; they only append to the queue
/// under its lock. With a [`BlockingLock`] the handle can be moved to other
/// threads.
///
/// # Example
///
/// ```rust
/// use hsm::core::{Event, State, StateId};
/// use hsm::Hsm;
///
/// struct Root;
///
/// impl State<()> for Root {
///     fn entry(&mut self, _: &mut ()) -> Option<StateId> {
///         None
///     }
///     fn exit(&mut self, _: &mut ()) {}
/// }
///
/// let hsm: Hsm<()> = Hsm::new(Root, ());
/// let producer = hsm.producer();
///
/// std::thread::spawn(move || producer.raise(Event::new(1)).unwrap())
///     .join()
///     .unwrap();
///
/// assert_eq!(hsm.pending(), 1);
/// ```
pub struct EventProducer<P = (), L = BlockingLock<EventQueue<P>>> {
    queue: Arc<L>,
    capacity: Option<usize>,
    machine: Uuid,
    _phantom: PhantomData<fn(Event<P>)>,
}

impl<P, L: Lock<EventQueue<P>>> EventProducer<P, L> {
    pub(crate) fn new(machine: Uuid, capacity: Option<usize>) -> Self {
        Self {
            queue: Arc::new(L::new(VecDeque::new())),
            capacity,
            machine,
            _phantom: PhantomData,
        }
    }

    /// Append an event at the tail of the queue.
    ///
    /// Fails with [`HsmError::QueueFull`] when a capacity is configured and
    /// reached, or [`HsmError::OutOfMemory`] when the queue cannot grow.
    pub fn raise(&self, event: Event<P>) -> Result<(), HsmError> {
        let signal = event.signal();
        let pending = self.queue.with(|queue| {
            if let Some(capacity) = self.capacity {
                if queue.len() >= capacity {
                    return Err(HsmError::QueueFull { capacity });
                }
            }
            queue.try_reserve(1)?;
            queue.push_back(event);
            Ok(queue.len())
        })?;

        trace!(machine = %self.machine, signal, pending, "Event raised");
        Ok(())
    }

    /// Number of events waiting to be dispatched.
    pub fn pending(&self) -> usize {
        self.queue.with(|queue| queue.len())
    }

    pub(crate) fn pop(&self) -> Option<Event<P>> {
        self.queue.with(|queue| queue.pop_front())
    }
}

impl<P, L> Clone for EventProducer<P, L> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            capacity: self.capacity,
            machine: self.machine,
            _phantom: PhantomData,
        }
    }
}

impl<P, L> fmt::Debug for EventProducer<P, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProducer")
            .field("machine", &self.machine)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
