//! Manual-override suppression window.
//!
//! After every user click the engine stops correcting drift for a short
//! window so it never fights the click, or the re-render that click causes.
//! Only one window is ever pending: starting a new one aborts the previous
//! expiry timer and bumps the generation, so a stale expiry that was already
//! queued cannot clear the new window early.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Single-owner suppression window state.
#[derive(Debug, Default)]
pub struct SuppressionWindow {
    active: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl SuppressionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Open a new window, superseding any pending one.
    ///
    /// When `duration` elapses, `expiry(generation)` is sent on `mailbox`;
    /// the owner must hand that generation back to [`Self::expire`].
    pub fn start<M, F>(&mut self, duration: Duration, mailbox: mpsc::UnboundedSender<M>, expiry: F) -> u64
    where
        M: Send + 'static,
        F: FnOnce(u64) -> M + Send + 'static,
    {
        self.cancel_timer();
        self.generation += 1;
        self.active = true;

        let generation = self.generation;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Receiver gone means the engine stopped; nothing left to clear.
            let _ = mailbox.send(expiry(generation));
        }));

        debug!(generation, window_ms = duration.as_millis(), "suppression window opened");
        generation
    }

    /// Close the window if `generation` is still the current one.
    ///
    /// Returns false for expiries of superseded windows.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.active {
            debug!(
                generation,
                current = self.generation,
                "ignoring stale suppression expiry"
            );
            return false;
        }
        self.active = false;
        self.timer = None;
        debug!(generation, "suppression window closed");
        true
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SuppressionWindow {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_expires_after_duration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut window = SuppressionWindow::new();

        let generation = window.start(Duration::from_millis(150), tx, |g| g);
        assert!(window.is_active());

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired, generation);
        assert!(window.expire(expired));
        assert!(!window.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_supersedes_old_one() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut window = SuppressionWindow::new();

        let first = window.start(Duration::from_millis(150), tx.clone(), |g| g);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = window.start(Duration::from_millis(150), tx, |g| g);
        assert_ne!(first, second);

        // The first timer was aborted, so the next expiry is the second one,
        // 150ms after it started.
        let start = tokio::time::Instant::now();
        let expired = rx.recv().await.unwrap();
        assert_eq!(expired, second);
        assert_eq!(start.elapsed(), Duration::from_millis(150));
        assert!(window.expire(expired));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut window = SuppressionWindow {
            active: true,
            generation: 3,
            timer: None,
        };

        assert!(!window.expire(2));
        assert!(window.is_active());
        assert!(window.expire(3));
        assert!(!window.expire(3));
    }
}
