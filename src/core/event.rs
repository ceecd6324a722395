//! Events and signals.
//!
//! An event is a signal value plus an optional typed payload. Signals are
//! plain `u32` values that handlers test by bitmask intersection, so a
//! machine that wants independent event kinds gives each kind its own bit
//! (see [`signals!`](crate::signals)).

use serde::{Deserialize, Serialize};

/// Signal identifying the kind of an [`Event`].
pub type Signal = u32;

/// Reserved "no signal" value. No handler mask intersects it.
pub const NO_SIGNAL: Signal = 0;

/// First signal value free for applications.
pub const USER_SIG: Signal = 1;

/// A signal carrier, optionally extended with a payload.
///
/// Events are created by producers, owned by the machine's queue until they
/// are consumed, then dropped.
///
/// # Example
///
/// ```rust
/// use hsm::core::Event;
///
/// let mut event = Event::new(0b0100);
/// assert_eq!(event.signal(), 0b0100);
///
/// event.set_signal(0b1000);
/// assert_eq!(event.signal(), 0b1000);
///
/// let reading = Event::with_payload(0b0010, 42u16);
/// assert_eq!(*reading.payload(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event<P = ()> {
    signal: Signal,
    payload: P,
}

impl Event<()> {
    /// Create an event carrying only a signal.
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            payload: (),
        }
    }
}

impl<P> Event<P> {
    /// Create an event carrying a signal and a payload.
    pub fn with_payload(signal: Signal, payload: P) -> Self {
        Self { signal, payload }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Replace the signal. This is the only mutation an event allows.
    pub fn set_signal(&mut self, signal: Signal) {
        self.signal = signal;
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl From<Signal> for Event<()> {
    fn from(signal: Signal) -> Self {
        Event::new(signal)
    }
}
