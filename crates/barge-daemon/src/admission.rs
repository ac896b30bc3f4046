//! Connection admission control.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Fixed-capacity gate shared across all connections.
///
/// A connection takes one slot when accepted and holds it until its handler
/// finishes. When every slot is taken, new connections are turned away
/// immediately; nothing queues.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    slots: Option<Arc<Semaphore>>,
}

/// One unit of the concurrency ceiling. Released exactly once, on drop.
#[derive(Debug)]
pub struct Slot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConnectionGate {
    /// Creates a gate admitting at most `capacity` concurrent connections.
    /// Zero means unlimited.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (capacity > 0).then(|| Arc::new(Semaphore::new(capacity))),
        }
    }

    /// Tries to take a slot without waiting.
    pub fn try_admit(&self) -> Option<Slot> {
        match &self.slots {
            None => Some(Slot { _permit: None }),
            Some(slots) => match Arc::clone(slots).try_acquire_owned() {
                Ok(permit) => Some(Slot {
                    _permit: Some(permit),
                }),
                Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_enforces_capacity() {
        let gate = ConnectionGate::new(2);
        let a = gate.try_admit().unwrap();
        let _b = gate.try_admit().unwrap();
        assert!(gate.try_admit().is_none());

        drop(a);
        assert!(gate.try_admit().is_some());
    }

    #[test]
    fn test_slot_releases_exactly_once() {
        let gate = ConnectionGate::new(1);
        for _ in 0..10 {
            let slot = gate.try_admit().unwrap();
            assert!(gate.try_admit().is_none());
            drop(slot);
        }
    }

    #[test]
    fn test_zero_capacity_is_unlimited() {
        let gate = ConnectionGate::new(0);
        let slots: Vec<_> = (0..100).map(|_| gate.try_admit().unwrap()).collect();
        assert_eq!(slots.len(), 100);
    }
}
