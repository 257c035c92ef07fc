use std::time::{Duration, Instant};

/// Host-side rate limiter called once after every simulated clock cycle.
pub trait Pacer {
    fn pace(&mut self);
}

/// Runs cycles back to back.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    #[inline]
    fn pace(&mut self) {}
}

/// Holds the simulation to a fixed clock frequency.
///
/// Sleeps until the next cycle is due. If the host falls behind, the
/// schedule restarts from the current instant instead of bursting.
#[derive(Clone, Copy, Debug)]
pub struct FixedRate {
    period: Duration,
    next_due: Option<Instant>,
}

impl FixedRate {
    pub fn new(hz: u32) -> Self {
        let hz = hz.max(1);
        log::debug!("pacing clock at {} Hz", hz);
        Self {
            period: Duration::from_secs(1) / hz,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Pacer for FixedRate {
    fn pace(&mut self) {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now + self.period);
        if due > now {
            std::thread::sleep(due - now);
            self.next_due = Some(due + self.period);
        } else {
            self.next_due = Some(now + self.period);
        }
    }
}
