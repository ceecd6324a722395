//! Motor Controller
//!
//! This example demonstrates a small hierarchical machine driven from a
//! producer thread.
//!
//! Key concepts:
//! - A composite `Running` state whose entry forwards to a default child
//! - A fault handler on the composite, inherited by its children
//! - Events raised on another thread and drained by the consumer
//!
//! Run with: cargo run --example motor_controller

use hsm::core::{Event, State, StateId};
use hsm::{signals, Hsm, HsmError};
use std::thread;

signals! {
    SIG_START,
    SIG_FAST,
    SIG_STOP,
    SIG_FAULT,
}

#[derive(Default)]
struct Motor {
    rpm: u32,
}

struct Controller {
    initial: Option<StateId>,
}

impl State<Motor> for Controller {
    fn name(&self) -> &str {
        "Controller"
    }

    fn entry(&mut self, _: &mut Motor) -> Option<StateId> {
        self.initial
    }

    fn exit(&mut self, _: &mut Motor) {}
}

/// A state that sets the motor speed on entry.
struct Speed {
    name: &'static str,
    rpm: u32,
    default_child: Option<StateId>,
}

impl Speed {
    fn new(name: &'static str, rpm: u32) -> Self {
        Self {
            name,
            rpm,
            default_child: None,
        }
    }
}

impl State<Motor> for Speed {
    fn name(&self) -> &str {
        self.name
    }

    fn entry(&mut self, motor: &mut Motor) -> Option<StateId> {
        motor.rpm = self.rpm;
        println!("  enter {:<8} rpm = {}", self.name, motor.rpm);
        self.default_child
    }

    fn exit(&mut self, _: &mut Motor) {
        println!("  exit  {}", self.name);
    }
}

fn main() -> Result<(), HsmError> {
    println!("=== Motor Controller Example ===\n");

    let mut hsm: Hsm<Motor> = Hsm::new(Controller { initial: None }, Motor::default());
    let stopped = hsm.add_state(Speed::new("Stopped", 0), StateId::ROOT)?;
    let running = hsm.add_state(Speed::new("Running", 0), StateId::ROOT)?;
    let slow = hsm.add_state(Speed::new("Slow", 600), running)?;
    let fast = hsm.add_state(Speed::new("Fast", 3000), running)?;
    let faulted = hsm.add_state(Speed::new("Faulted", 0), StateId::ROOT)?;

    hsm.state_mut(running)?.default_child = Some(slow.id());

    let (to_running, to_fast, to_stopped, to_faulted) =
        (running.id(), fast.id(), stopped.id(), faulted.id());
    hsm.attach(stopped, SIG_START, move |_, _, _| Some(to_running))?;
    hsm.attach(slow, SIG_FAST, move |_, _, _| Some(to_fast))?;
    hsm.attach(running, SIG_STOP, move |_, _, _| Some(to_stopped))?;
    hsm.attach(running, SIG_FAULT, move |_, _, _| Some(to_faulted))?;

    let root = hsm.root::<Controller>()?;
    hsm.state_mut(root)?.initial = Some(stopped.id());

    println!("Starting:");
    let active = hsm.init()?;
    println!("Active: {}\n", hsm.state_name(active).unwrap_or("?"));

    let producer = hsm.producer();
    let operator = thread::spawn(move || -> Result<(), HsmError> {
        for signal in [SIG_START, SIG_FAST, SIG_STOP, SIG_START, SIG_FAULT] {
            producer.raise(Event::new(signal))?;
        }
        Ok(())
    });
    operator.join().expect("operator thread panicked")?;

    println!("Dispatching {} events:", hsm.pending());
    let active = hsm.dispatch_events()?;
    println!("\nActive: {}", hsm.state_name(active).unwrap_or("?"));
    println!("Motor rpm: {}", hsm.context().rpm);
    println!("Transitions recorded: {}", hsm.history().len());

    println!("\n=== Example Complete ===");
    Ok(())
}
