//! Liveness and readiness flags
//!
//! [`HealthStatus`] is created once at startup, shared behind an `Arc` with
//! the health HTTP server, and flipped by the main task. Both flags start
//! `false` so probes fail closed until the webhook is listening.
//!
//! Each flag is atomic on its own; the pair is not updated as a unit, so a
//! reader may briefly observe `healthy=true, ready=false` during startup.

use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe health and readiness flags
#[derive(Debug, Default)]
pub struct HealthStatus {
    healthy: AtomicBool,
    ready: AtomicBool,
}

impl HealthStatus {
    /// Create a status that is neither healthy nor ready
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_unhealthy_and_unready() {
        let status = HealthStatus::new();
        assert!(!status.is_healthy());
        assert!(!status.is_ready());
    }

    #[test]
    fn test_flags_are_independent() {
        let status = HealthStatus::new();

        status.set_healthy(true);
        assert!(status.is_healthy());
        assert!(!status.is_ready());

        status.set_ready(true);
        status.set_healthy(false);
        assert!(!status.is_healthy());
        assert!(status.is_ready());

        status.set_ready(false);
        assert!(!status.is_ready());
    }

    #[test]
    fn test_concurrent_readers_see_the_write() {
        let status = Arc::new(HealthStatus::new());

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let status = Arc::clone(&status);
                std::thread::spawn(move || {
                    while !status.is_ready() {
                        std::hint::spin_loop();
                    }
                    status.is_ready()
                })
            })
            .collect();

        status.set_healthy(true);
        status.set_ready(true);

        for reader in readers {
            assert!(reader.join().unwrap());
        }
    }
}
