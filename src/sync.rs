//! Spin backoff used by the retry loops of the queue and the policy.
//!
//! Nothing here blocks or parks a thread: a contended compare-and-swap is
//! retried after a short, exponentially growing run of spin-loop hints.

/// Upper bound on the exponent, so a single backoff never spins more than
/// `1 << SPIN_LIMIT` times.
const SPIN_LIMIT: u32 = 6;

/// Exponential spin backoff for compare-and-swap retry loops.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    /// Creates a backoff that starts with a single spin.
    #[inline]
    pub(crate) fn new() -> Self {
        Backoff { step: 0 }
    }

    /// Spins for the current step and grows the next one, up to the limit.
    #[inline]
    pub(crate) fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(SPIN_LIMIT) {
            core::hint::spin_loop();
        }
        if self.step <= SPIN_LIMIT {
            self.step += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_step_is_bounded() {
        let mut backoff = Backoff::new();
        for _ in 0..100 {
            backoff.spin();
        }
        assert_eq!(backoff.step, SPIN_LIMIT + 1);
    }
}
