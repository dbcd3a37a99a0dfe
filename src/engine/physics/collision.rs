use rapier2d::prelude::*;
use std::sync::{Arc, Mutex};

/// A contact-begin pair, in the order rapier reported it
pub type ColliderPair = (ColliderHandle, ColliderHandle);

/// Queue for contact-begin events produced during a physics step
///
/// The step runs with the pipeline's internals borrowed, so nothing may
/// mutate bodies from inside the event handler. The handler only appends
/// pairs here; the game drains them once per tick, after the step returns.
pub struct ContactQueue {
    started: Arc<Mutex<Vec<ColliderPair>>>,
}

impl ContactQueue {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Mutex::new(Vec::with_capacity(32))),
        }
    }

    /// Clear buffered events (call before each physics step)
    pub fn clear(&self) {
        if let Ok(mut started) = self.started.lock() {
            started.clear();
        }
    }

    /// Take all contact-begin pairs buffered during the last step
    pub fn take(&self) -> Vec<ColliderPair> {
        self.started
            .lock()
            .map(|mut started| std::mem::take(&mut *started))
            .unwrap_or_default()
    }

    fn push(&self, pair: ColliderPair) {
        if let Ok(mut started) = self.started.lock() {
            started.push(pair);
        }
    }
}

impl Default for ContactQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ContactQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Only contact-begin matters to the dispatcher; separations are ignored
        if let CollisionEvent::Started(h1, h2, _flags) = event {
            self.push((h1, h2));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_starts_empty() {
        let queue = ContactQueue::new();
        assert!(queue.take().is_empty());
    }

    #[test]
    fn test_take_drains_queue() {
        let queue = ContactQueue::new();
        let h = ColliderHandle::invalid();
        queue.push((h, h));
        assert_eq!(queue.take().len(), 1);
        assert!(queue.take().is_empty());
    }

    #[test]
    fn test_clear_discards_events() {
        let queue = ContactQueue::new();
        let h = ColliderHandle::invalid();
        queue.push((h, h));
        queue.clear();
        assert!(queue.take().is_empty());
    }
}
