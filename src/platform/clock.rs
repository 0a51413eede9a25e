//! Elapsed-time source
//!
//! A ticker thread refreshes a shared millisecond counter every period.
//! Readers take an atomic snapshot and never block the simulation; the
//! value may lag by up to one period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Read side of the elapsed-time counter
#[derive(Debug, Clone, Default)]
pub struct ClockReader {
    millis: Arc<AtomicU64>,
}

impl ClockReader {
    /// A reader that only moves when [`ClockReader::advance`] is called
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Move the counter forward by `by`
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(ms, Ordering::Relaxed);
    }

    fn store(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.millis.store(ms, Ordering::Relaxed);
    }
}

/// Background ticker owning the write side
pub struct ElapsedClock {
    reader: ClockReader,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ElapsedClock {
    /// Spawn the ticker, refreshing every `period`
    pub fn start(period: Duration) -> Self {
        let reader = ClockReader::default();
        let running = Arc::new(AtomicBool::new(true));
        let period = period.max(Duration::from_millis(1));

        let worker = {
            let reader = reader.clone();
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("elapsed-clock".into())
                .spawn(move || {
                    let started = Instant::now();
                    while running.load(Ordering::Acquire) {
                        reader.store(started.elapsed());
                        thread::sleep(period);
                    }
                    reader.store(started.elapsed());
                })
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn clock thread: {}", e);
                None
            }
        };

        log::info!("Elapsed clock started ({} ms period)", period.as_millis());
        Self {
            reader,
            running,
            worker,
        }
    }

    pub fn reader(&self) -> ClockReader {
        self.reader.clone()
    }

    /// Stop the ticker and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Clock thread panicked");
            }
            log::info!("Elapsed clock stopped at {:?}", self.reader.elapsed());
        }
    }
}

impl Drop for ElapsedClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_reader_advances() {
        let reader = ClockReader::manual();
        assert_eq!(reader.elapsed(), Duration::ZERO);
        reader.advance(Duration::from_millis(1500));
        let shared = reader.clone();
        shared.advance(Duration::from_secs(2));
        assert_eq!(reader.elapsed(), Duration::from_millis(3500));
        assert!((reader.elapsed_secs() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_ticker_moves_forward_and_stops() {
        let mut clock = ElapsedClock::start(Duration::from_millis(5));
        let reader = clock.reader();
        thread::sleep(Duration::from_millis(60));
        clock.stop();
        let stopped_at = reader.elapsed();
        assert!(stopped_at >= Duration::from_millis(20));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(reader.elapsed(), stopped_at);
        clock.stop();
    }
}
