// Cooperative timers polled once per simulation tick
//
// Timers are plain data owned by the level, never threads: dropping the
// level drops every pending timer along with the scene it targeted.

/// A pending one-shot timer
struct Timer<K> {
    remaining: f32,
    kind: K,
}

/// Queue of one-shot timers, polled by the update loop
///
/// Repetition is the caller's decision: a fired timer is removed, and the
/// handler re-schedules if another round is wanted.
pub struct TimerQueue<K> {
    timers: Vec<Timer<K>>,
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self { timers: Vec::new() }
    }

    /// Schedule `kind` to fire after `delay` seconds
    pub fn schedule(&mut self, delay: f32, kind: K) {
        self.timers.push(Timer {
            remaining: delay,
            kind,
        });
    }

    /// Advance all timers by `dt` and return the kinds that fired
    pub fn poll(&mut self, dt: f32) -> Vec<K> {
        let mut fired = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            self.timers[i].remaining -= dt;
            if self.timers[i].remaining <= 0.0 {
                fired.push(self.timers.swap_remove(i).kind);
            } else {
                i += 1;
            }
        }
        fired
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_after_delay() {
        let mut q = TimerQueue::new();
        q.schedule(0.5, "tick");
        assert!(q.poll(0.25).is_empty());
        assert_eq!(q.poll(0.25), vec!["tick"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_multiple_timers_fire_independently() {
        let mut q = TimerQueue::new();
        q.schedule(0.1, 1);
        q.schedule(0.3, 2);
        assert_eq!(q.poll(0.2), vec![1]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.poll(0.2), vec![2]);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut q = TimerQueue::new();
        q.schedule(0.1, ());
        q.clear();
        assert!(q.poll(1.0).is_empty());
    }
}
