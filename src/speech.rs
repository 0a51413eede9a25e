//! Narration queue
//!
//! `speak` events become requests on a bounded queue drained by one
//! worker thread, so slow narration never stalls the simulation. A full
//! queue drops the request with a warning. A request identical to the
//! previous one is coalesced while that one is still waiting or being
//! narrated. Stopping drains whatever is already queued, then joins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::sim::events::{GameEvent, Observer, ObserverError};

/// Performs the (possibly slow) narration of one text
pub trait Narrator: Send + 'static {
    fn narrate(&mut self, text: &str);
}

/// Narrator that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNarrator;

impl Narrator for LogNarrator {
    fn narrate(&mut self, text: &str) {
        log::info!("[speech] {}", text);
    }
}

enum Request {
    Say(String),
    Stop,
}

/// Cloneable producer side of the queue
#[derive(Clone)]
pub struct SpeechHandle {
    tx: SyncSender<Request>,
    /// Requests queued or being narrated
    pending: Arc<AtomicUsize>,
    /// Text of the most recent accepted request
    last: Arc<Mutex<Option<String>>>,
}

impl std::fmt::Debug for SpeechHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechHandle")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish()
    }
}

impl SpeechHandle {
    /// Queue `text` for narration. Never blocks.
    pub fn enqueue(&self, text: impl Into<String>) {
        let text = text.into();
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.pending.load(Ordering::Acquire) > 0 && last.as_deref() == Some(text.as_str()) {
            log::debug!("Coalesced repeated speech request: {}", text);
            return;
        }

        self.pending.fetch_add(1, Ordering::AcqRel);
        match self.tx.try_send(Request::Say(text.clone())) {
            Ok(()) => *last = Some(text),
            Err(TrySendError::Full(_)) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                log::warn!("Speech queue full, dropping: {}", text);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                log::warn!("Speech service stopped, dropping: {}", text);
            }
        }
    }

    /// Requests not yet fully narrated
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl Observer for SpeechHandle {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), ObserverError> {
        if let GameEvent::Speak { text } = event {
            self.enqueue(text.as_str());
        }
        Ok(())
    }
}

/// Owner of the narration worker
pub struct SpeechService {
    handle: SpeechHandle,
    worker: Option<JoinHandle<()>>,
}

impl SpeechService {
    /// Spawn the worker with a queue of `capacity` requests
    pub fn start(narrator: impl Narrator, capacity: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let handle = SpeechHandle {
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        };

        let pending = Arc::clone(&handle.pending);
        let worker = thread::Builder::new()
            .name("speech".into())
            .spawn(move || run_worker(narrator, rx, pending));
        let worker = match worker {
            Ok(worker) => Some(worker),
            Err(e) => {
                log::error!("Failed to spawn speech thread: {}", e);
                None
            }
        };

        log::info!("Speech service started (capacity {})", capacity.max(1));
        Self { handle, worker }
    }

    /// A producer for the queue, usable as an [`Observer`]
    pub fn handle(&self) -> SpeechHandle {
        self.handle.clone()
    }

    /// Narrate everything already queued, then stop the worker. Idempotent.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if self.handle.tx.send(Request::Stop).is_err() {
            log::warn!("Speech worker already gone");
        }
        if worker.join().is_err() {
            log::error!("Speech thread panicked");
        }
        log::info!("Speech service stopped");
    }
}

impl Drop for SpeechService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(mut narrator: impl Narrator, rx: Receiver<Request>, pending: Arc<AtomicUsize>) {
    while let Ok(request) = rx.recv() {
        match request {
            Request::Say(text) => {
                narrator.narrate(&text);
                pending.fetch_sub(1, Ordering::AcqRel);
            }
            Request::Stop => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::Notifier;
    use crate::sim::level::{LevelKind, LevelOutcome};

    /// Records narrations; optionally waits for a permit before each one
    struct Recorder {
        spoken: Arc<Mutex<Vec<String>>>,
        started: Option<mpsc::Sender<()>>,
        gate: Option<mpsc::Receiver<()>>,
    }

    impl Narrator for Recorder {
        fn narrate(&mut self, text: &str) {
            if let Some(started) = &self.started {
                let _ = started.send(());
            }
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            self.spoken.lock().unwrap().push(text.to_string());
        }
    }

    fn recorder() -> (Recorder, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            spoken: Arc::clone(&spoken),
            started: None,
            gate: None,
        };
        (recorder, spoken)
    }

    /// Recorder that blocks on every item until `gate` sends (or is dropped)
    fn gated() -> (Recorder, Arc<Mutex<Vec<String>>>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (mut recorder, spoken) = recorder();
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        recorder.started = Some(started_tx);
        recorder.gate = Some(gate_rx);
        (recorder, spoken, started_rx, gate_tx)
    }

    #[test]
    fn test_fifo_and_stop_drains() {
        let (narrator, spoken) = recorder();
        let mut service = SpeechService::start(narrator, 8);
        let handle = service.handle();
        for text in ["pa", "to", "¡Excelente!"] {
            handle.enqueue(text);
        }
        service.stop();
        assert_eq!(*spoken.lock().unwrap(), ["pa", "to", "¡Excelente!"]);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_consecutive_duplicates_coalesce() {
        let (narrator, spoken, started, gate) = gated();
        let mut service = SpeechService::start(narrator, 8);
        let handle = service.handle();

        handle.enqueue("ma");
        started.recv().unwrap();
        handle.enqueue("ma");
        handle.enqueue("ri");
        handle.enqueue("ma");
        drop(gate);
        service.stop();

        assert_eq!(*spoken.lock().unwrap(), ["ma", "ri", "ma"]);
    }

    #[test]
    fn test_repeat_after_narration_is_spoken() {
        let (narrator, spoken) = recorder();
        let mut service = SpeechService::start(narrator, 4);
        let handle = service.handle();
        handle.enqueue("sol");
        while handle.pending() > 0 {
            thread::yield_now();
        }
        handle.enqueue("sol");
        service.stop();
        assert_eq!(*spoken.lock().unwrap(), ["sol", "sol"]);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (narrator, spoken, started, gate) = gated();
        let mut service = SpeechService::start(narrator, 2);
        let handle = service.handle();

        handle.enqueue("a");
        started.recv().unwrap();
        handle.enqueue("b");
        handle.enqueue("c");
        handle.enqueue("d");
        drop(gate);
        service.stop();

        assert_eq!(*spoken.lock().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_enqueue_after_stop_is_dropped() {
        let (narrator, spoken) = recorder();
        let mut service = SpeechService::start(narrator, 2);
        let handle = service.handle();
        service.stop();
        service.stop();
        handle.enqueue("tarde");
        assert!(spoken.lock().unwrap().is_empty());
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_handle_observes_speak_events_only() {
        let (narrator, spoken) = recorder();
        let mut service = SpeechService::start(narrator, 8);
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(service.handle()));

        notifier.speak("Nivel 1");
        notifier.publish(&GameEvent::LevelFinished {
            kind: LevelKind::OrderedAssembly,
            outcome: LevelOutcome::Solved,
        });
        notifier.publish(&GameEvent::SessionFinished { score: 300 });
        service.stop();

        assert_eq!(*spoken.lock().unwrap(), ["Nivel 1"]);
    }
}
