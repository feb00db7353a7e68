//! Periodic reconnection driver.
//!
//! Runs in a background thread. Every retry interval it checks the link and
//! runs one reconnection pass. The manager is locked for the link check and
//! then once per candidate network, so no request waits longer than one
//! association attempt.

use super::manager::SharedManager;
use super::radio::WifiRadio;
use super::state::ConnectionMode;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of the shutdown check.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Pause between attempts of one pass, with the manager unlocked, so queued
/// request handlers get the lock.
const ATTEMPT_GAP: Duration = Duration::from_millis(10);

/// Background retry thread. Drop it to stop.
pub struct RetryTicker {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl RetryTicker {
    /// Start ticking `manager` every `interval`.
    pub fn start<R: WifiRadio + 'static>(
        manager: SharedManager<R>,
        interval: Duration,
    ) -> Result<Self, std::io::Error> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("wifi-retry".into())
            .spawn(move || Self::run(manager, interval, shutdown_clone))?;

        info!("Retry ticker started, interval {:?}", interval);
        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    fn run<R: WifiRadio>(manager: SharedManager<R>, interval: Duration, shutdown: Arc<AtomicBool>) {
        let mut next_tick = Instant::now() + interval;
        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("Retry ticker shutting down");
                break;
            }

            let now = Instant::now();
            if now < next_tick {
                thread::sleep((next_tick - now).min(SHUTDOWN_POLL));
                continue;
            }
            next_tick = now + interval;

            if Self::tick(&manager, &shutdown).is_err() {
                error!("Connection manager lock poisoned, stopping retry ticker");
                break;
            }
        }
    }

    /// One reconnection pass, locking the manager for one attempt at a time.
    fn tick<R: WifiRadio>(manager: &SharedManager<R>, shutdown: &AtomicBool) -> Result<(), ()> {
        let candidates = {
            let mut manager = manager.lock().map_err(|_| ())?;
            manager.check_link();
            manager.retry_candidates()
        };

        for (i, credential) in candidates.iter().enumerate() {
            if i > 0 {
                thread::sleep(ATTEMPT_GAP);
            }
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            let mode = manager.lock().map_err(|_| ())?.retry_attempt(credential);
            debug!("Retry of {} done, mode {}", credential.ssid, mode);
            if mode != ConnectionMode::AccessPoint {
                break;
            }
        }
        Ok(())
    }

    /// Stop the ticker and wait for the thread.
    ///
    /// May block for one in-flight tick (bounded by the connect timeout).
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RetryTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
