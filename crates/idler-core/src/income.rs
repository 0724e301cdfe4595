//! Passive income from hired helpers.

use crate::fixed::Seconds;
use crate::resource::{Ledger, ResourceKind, ResourceMap};

/// What one helper payout granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperPayout {
    pub helpers: u32,
    pub granted: ResourceMap<u64>,
}

/// Accumulates elapsed time and pays out every `interval` seconds while at
/// least one helper is hired.
#[derive(Debug, Clone, Default)]
pub struct HelperTimer {
    elapsed: Seconds,
}

impl HelperTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    /// Advance by `dt`. Each full interval grants `helpers * droplet
    /// multiplier` droplets and `helpers` of every ingredient. The remainder
    /// carries over to the next call.
    pub fn tick(
        &mut self,
        dt: Seconds,
        interval: Seconds,
        helpers: u32,
        ledger: &mut Ledger,
    ) -> Option<HelperPayout> {
        if helpers == 0 || interval <= Seconds::ZERO {
            self.elapsed = Seconds::ZERO;
            return None;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed < interval {
            return None;
        }

        // Whole intervals elapsed, computed on the raw fixed-point bits.
        let elapsed_bits = self.elapsed.to_bits();
        let interval_bits = interval.to_bits();
        let payouts = (elapsed_bits / interval_bits) as u64;
        self.elapsed = Seconds::from_bits(elapsed_bits % interval_bits);

        let per = u64::from(helpers).saturating_mul(payouts);
        let droplets = per.saturating_mul(u64::from(ledger.multiplier(ResourceKind::Droplets)));
        let granted = ResourceMap {
            droplets,
            leaves: per,
            berries: per,
            flowers: per,
        };

        for (kind, amount) in granted.iter() {
            ledger.credit(kind, amount);
        }
        tracing::debug!(helpers, droplets = granted.droplets, "helper income");
        Some(HelperPayout { helpers, granted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn no_helpers_no_income() {
        let mut ledger = sample_ledger();
        let mut timer = HelperTimer::new();
        assert_eq!(timer.tick(secs(100), secs(5), 0, &mut ledger), None);
        assert_eq!(ledger.resources(), ResourceMap::default());
        assert_eq!(timer.elapsed(), Seconds::ZERO);
    }

    #[test]
    fn pays_each_interval_and_carries_remainder() {
        let mut ledger = sample_ledger();
        let mut timer = HelperTimer::new();

        assert_eq!(timer.tick(secs(3), secs(5), 2, &mut ledger), None);
        let payout = timer.tick(secs(3), secs(5), 2, &mut ledger).unwrap();
        assert_eq!(payout.granted.droplets, 2);
        assert_eq!(payout.granted.leaves, 2);
        assert_eq!(timer.elapsed(), secs(1));
        assert_eq!(ledger.get(ResourceKind::Flowers), 2);
    }

    #[test]
    fn droplet_income_uses_multiplier() {
        let mut ledger = sample_ledger();
        ledger.raise_baseline(ResourceKind::Droplets, 2);
        let mut timer = HelperTimer::new();
        let payout = timer.tick(secs(10), secs(5), 1, &mut ledger).unwrap();
        assert_eq!(payout.granted.droplets, 6);
        assert_eq!(payout.granted.berries, 2);
    }

    #[test]
    fn long_step_pays_every_interval_at_once() {
        let mut ledger = sample_ledger();
        let mut timer = HelperTimer::new();
        let interval = Seconds::from_bits(1 << 22); // 1/1024 s
        let payout = timer
            .tick(secs(1_000_000) + secs(1) / 2048, interval, 3, &mut ledger)
            .unwrap();
        assert_eq!(payout.granted.leaves, 3 * 1_024_000_000);
        assert_eq!(payout.granted.droplets, 3 * 1_024_000_000);
        assert_eq!(timer.elapsed(), secs(1) / 2048);
    }
}
