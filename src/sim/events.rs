//! Semantic game events and their synchronous fan-out
//!
//! Levels publish events (mostly `Speak`) through a [`Notifier`]; each
//! subscribed [`Observer`] sees every event in subscription order. A
//! failing or panicking observer is logged and skipped, never allowed to
//! stop delivery to the observers after it.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::level::{LevelKind, LevelOutcome};

/// Something observers may react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Feedback to be narrated
    Speak { text: String },
    /// A level reached its terminal state
    LevelFinished { kind: LevelKind, outcome: LevelOutcome },
    /// Every level is done
    SessionFinished { score: u64 },
}

impl GameEvent {
    pub fn speak(text: impl Into<String>) -> Self {
        GameEvent::Speak { text: text.into() }
    }
}

/// Observer delivery failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// Receives published events
pub trait Observer {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), ObserverError>;
}

/// Ordered list of observers
#[derive(Default)]
pub struct Notifier {
    observers: Vec<Box<dyn Observer>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer; delivery order is subscription order
    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer. Returns how many accepted it.
    pub fn publish(&mut self, event: &GameEvent) -> usize {
        let mut delivered = 0;
        for (i, observer) in self.observers.iter_mut().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => log::warn!("Observer {} rejected {:?}: {}", i, event, e),
                Err(_) => log::error!("Observer {} panicked on {:?}", i, event),
            }
        }
        delivered
    }

    /// Shorthand for publishing a `Speak` event
    pub fn speak(&mut self, text: impl Into<String>) {
        self.publish(&GameEvent::speak(text));
    }
}

/// Observer that records every event, for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: std::rc::Rc<std::cell::RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    /// Texts of the recorded `Speak` events
    pub fn spoken(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GameEvent::Speak { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Observer for EventLog {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), ObserverError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
