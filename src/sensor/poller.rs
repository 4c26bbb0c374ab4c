//! Background sensor polling.
//!
//! The poller thread publishes into a single-slot mailbox. The game loop only
//! ever sees the most recent reading; older ones are overwritten, never queued.

use super::sampler::DistanceSource;
use crate::core::constants::NO_READING;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Latest-value-wins handoff between the poller and the game loop.
#[derive(Debug, Clone, Default)]
pub struct LatestDistance {
    slot: Arc<Mutex<Option<f64>>>,
}

impl LatestDistance {
    pub fn publish(&self, distance: f64) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(distance);
    }

    /// Take the newest unread value, leaving the slot empty.
    pub fn take(&self) -> Option<f64> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

pub struct SensorPoller {
    mailbox: LatestDistance,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    last: f64,
}

impl SensorPoller {
    /// Start sampling `source` on its own thread, pausing `interval` between readings.
    pub fn spawn<S>(mut source: S, interval: Duration) -> std::io::Result<Self>
    where
        S: DistanceSource + Send + 'static,
    {
        let mailbox = LatestDistance::default();
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let mailbox = mailbox.clone();
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("sensor-poller".to_string())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        mailbox.publish(source.stable_distance());
                        thread::sleep(interval);
                    }
                    tracing::debug!("sensor poller stopped");
                })?
        };

        Ok(Self {
            mailbox,
            stop,
            handle: Some(handle),
            last: NO_READING,
        })
    }

    /// Signal the thread to stop and wait for it.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("sensor poller panicked");
            }
        }
    }
}

impl DistanceSource for SensorPoller {
    /// Newest published reading, or the previous one if nothing new arrived.
    fn stable_distance(&mut self) -> f64 {
        if let Some(distance) = self.mailbox.take() {
            self.last = distance;
        }
        self.last
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;

    struct Counting(Arc<AtomicU32>);

    impl DistanceSource for Counting {
        fn stable_distance(&mut self) -> f64 {
            self.0.fetch_add(1, Ordering::SeqCst) as f64 + 1.0
        }
    }

    #[test]
    fn test_mailbox_keeps_only_latest() {
        let mailbox = LatestDistance::default();
        mailbox.publish(10.0);
        mailbox.publish(20.0);
        mailbox.publish(30.0);
        assert_eq!(mailbox.take(), Some(30.0));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_poller_publishes_and_repeats_last_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut poller =
            SensorPoller::spawn(Counting(Arc::clone(&calls)), Duration::from_millis(1)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = NO_READING;
        while seen == NO_READING && Instant::now() < deadline {
            seen = poller.stable_distance();
            thread::sleep(Duration::from_millis(1));
        }
        assert!(seen >= 1.0);

        poller.shutdown();
        let after_stop = poller.stable_distance();
        // nothing new after shutdown beyond what was already published
        assert_eq!(poller.stable_distance(), after_stop);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut poller =
            SensorPoller::spawn(Counting(calls), Duration::from_millis(1)).unwrap();
        poller.shutdown();
        poller.shutdown();
    }
}
