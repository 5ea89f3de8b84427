//! Cancelable single-shot timers on a logical clock.
//!
//! The owner advances the clock explicitly, which keeps debounce behavior
//! deterministic and independent of any runtime.

use std::time::Duration;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug)]
struct Pending<E> {
    token: TimerToken,
    deadline: Duration,
    event: E,
}

/// Queue of pending timers carrying events of type `E`.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to fire after `delay`.
    pub fn schedule(&mut self, event: E, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            token,
            deadline: self.now + delay,
            event,
        });
        token
    }

    /// Cancel a timer. Returns `false` if it already fired or was canceled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    /// Cancel the timer in `slot` (if any) and schedule a new one in its place.
    pub fn rearm(&mut self, slot: &mut Option<TimerToken>, event: E, delay: Duration) {
        if let Some(token) = slot.take() {
            self.cancel(token);
        }
        *slot = Some(self.schedule(event, delay));
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|p| p.deadline.saturating_sub(self.now))
            .min()
    }

    /// Advance the clock by `elapsed` and return the due events with their
    /// tokens, in deadline order (ties in scheduling order).
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(TimerToken, E)> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.deadline <= now);
        self.pending = rest;

        due.sort_by_key(|p| (p.deadline, p.token.0));
        due.into_iter().map(|p| (p.token, p.event)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule("late", ms(300));
        timers.schedule("early", ms(100));

        assert!(timers.advance(ms(50)).is_empty());
        let fired: Vec<_> = timers.advance(ms(300)).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let token = timers.schedule(1, ms(10));
        assert!(timers.cancel(token));
        assert!(!timers.cancel(token));
        assert!(timers.advance(ms(20)).is_empty());
    }

    #[test]
    fn test_rearm_restarts_window() {
        let mut timers = TimerQueue::new();
        let mut slot = None;
        timers.rearm(&mut slot, "a", ms(300));
        timers.advance(ms(200));
        timers.rearm(&mut slot, "b", ms(300));

        assert!(timers.advance(ms(200)).is_empty());
        assert_eq!(timers.next_deadline(), Some(ms(100)));
        let fired = timers.advance(ms(100));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, "b");
    }
}
