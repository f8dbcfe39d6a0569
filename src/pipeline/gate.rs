use std::time::Instant;

/// Single-flight gate over the clipboard transaction
/// A trigger that arrives while the gate is held is dropped before any OS
/// call happens; the event loop releases the gate exactly once, on the tick
/// where the transaction reports its outcome
pub struct ReentrancyGate {
    held_since: Option<Instant>,
}

impl ReentrancyGate {
    pub fn new() -> ReentrancyGate {
        ReentrancyGate { held_since: None }
    }

    /// Take the gate; false means a transaction is already in flight
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.held_since.is_some() {
            return false;
        }
        self.held_since = Some(now);
        true
    }

    /// Give the gate back
    pub fn release(&mut self) {
        match self.held_since.take() {
            Some(since) => log::debug!("Transaction gate released after {:?}", since.elapsed()),
            None => log::error!("Reentrancy gate released while not held"),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_since.is_some()
    }
}

impl Default for ReentrancyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_then_release() {
        let mut gate = ReentrancyGate::new();
        let now = Instant::now();
        assert!(!gate.is_held());
        assert!(gate.try_acquire(now));
        assert!(gate.is_held());
        gate.release();
        assert!(!gate.is_held());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let mut gate = ReentrancyGate::new();
        let now = Instant::now();
        assert!(gate.try_acquire(now));
        assert!(!gate.try_acquire(now));
        gate.release();
        assert!(gate.try_acquire(now));
    }

    #[test]
    fn test_release_while_unheld_does_not_panic() {
        let mut gate = ReentrancyGate::new();
        gate.release();
        assert!(!gate.is_held());
    }
}
