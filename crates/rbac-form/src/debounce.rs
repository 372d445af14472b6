//! Debounced search input.

use std::time::Duration;

use tokio::time::Instant;

/// Default settle period for search input.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Tracks typed search terms and decides when one has settled.
///
/// A term fires once no further input arrived for the settle period, and
/// only if it differs from the last term that fired. The tracker is driven
/// by explicit instants so it can be polled from any event loop;
/// [`settled`](Self::settled) waits on the tokio clock instead.
#[derive(Debug, Clone)]
pub struct Debouncer {
    settle: Duration,

    /// Latest unsettled input and when it arrived.
    pending: Option<(String, Instant)>,

    /// Last term that fired.
    last_fired: Option<String>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pending: None,
            last_fired: None,
        }
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Record input typed at `now`. Restarts the settle period.
    pub fn input(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now));
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending input settles.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.settle)
    }

    /// Take the pending term if it has settled by `now`.
    ///
    /// Returns `None` while input is still settling, and also when the
    /// settled term equals the last one that fired.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }

        let (term, _) = self.pending.take()?;
        if self.last_fired.as_deref() == Some(term.as_str()) {
            return None;
        }
        self.last_fired = Some(term.clone());
        Some(term)
    }

    /// Drop pending input without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Forget the last fired term so the next one fires even if equal.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_fired = None;
    }

    /// Wait for the pending input to settle.
    ///
    /// Returns `None` immediately when nothing is pending, or when the
    /// settled term repeats the last one.
    pub async fn settled(&mut self) -> Option<String> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.poll(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_settle_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.input("ad", start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert!(debouncer.is_pending());
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(300)),
            Some("ad".to_string())
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_only_last_term_fires() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.input("a", start);
        debouncer.input("ad", start + Duration::from_millis(100));
        debouncer.input("adm", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(500)),
            Some("adm".to_string())
        );
    }

    #[test]
    fn test_repeated_term_is_suppressed() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.input("x", start);
        assert!(debouncer.poll(start + DEFAULT_DEBOUNCE).is_some());

        debouncer.input("x", start + Duration::from_secs(1));
        assert_eq!(debouncer.poll(start + Duration::from_secs(2)), None);

        debouncer.reset();
        debouncer.input("x", start + Duration::from_secs(3));
        assert!(debouncer.poll(start + Duration::from_secs(4)).is_some());
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.input("x", start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_waits_on_tokio_clock() {
        let mut debouncer = Debouncer::default();
        debouncer.input("role", Instant::now());
        assert_eq!(debouncer.settled().await, Some("role".to_string()));
        assert_eq!(debouncer.settled().await, None);
    }
}
