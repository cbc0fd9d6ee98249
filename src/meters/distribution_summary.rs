use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// Tracks the distribution of arbitrary-valued samples, such as payload sizes
/// or queue latencies already expressed as numbers. The wire shape matches
/// [`Timer`](super::Timer) with `totalAmount` in place of `totalTime`.
#[derive(Clone, Debug)]
pub struct DistributionSummary {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: Arc<Id>,
    count: AtomicU64,
    total: AtomicF64,
    total_sq: AtomicF64,
    max: AtomicF64,
}

impl DistributionSummary {
    pub(crate) fn new(id: Arc<Id>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                count: AtomicU64::new(0),
                total: AtomicF64::new(0.0),
                total_sq: AtomicF64::new(0.0),
                max: AtomicF64::new(0.0),
            }),
        }
    }

    /// Record one sample.
    pub fn record(&self, amount: f64) {
        self.inner.count.fetch_add(1, Ordering::Relaxed);
        self.inner.total.add(amount);
        self.inner.total_sq.add(amount * amount);
        self.inner.max.max(amount);
    }

    /// Samples recorded since the last poll.
    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Sum of the recorded samples since the last poll.
    pub fn total_amount(&self) -> f64 {
        self.inner.total.load()
    }
}

impl Meter for DistributionSummary {
    fn meter_id(&self) -> &Arc<Id> {
        &self.inner.id
    }

    fn measure(&self) -> Measurements {
        let count = self.inner.count.swap(0, Ordering::Relaxed);
        if count == 0 {
            return Measurements::new();
        }
        let total = self.inner.total.swap(0.0);
        let total_sq = self.inner.total_sq.swap(0.0);
        let max = self.inner.max.swap(0.0);
        smallvec![
            Measurement::new(self.inner.id.with_stat("count"), count as f64),
            Measurement::new(self.inner.id.with_stat("totalAmount"), total),
            Measurement::new(self.inner.id.with_stat("totalOfSquares"), total_sq),
            Measurement::new(self.inner.id.with_stat("max"), max),
        ]
    }

    fn meter_type(&self) -> MeterType {
        MeterType::DistributionSummary
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::id::Tags;

    use super::*;

    fn summary(name: &str) -> DistributionSummary {
        DistributionSummary::new(Arc::new(Id::new(name, Tags::new())))
    }

    #[test]
    fn drains_all_four_statistics() {
        let sizes = summary("request.size");
        sizes.record(100.0);
        sizes.record(300.0);

        let measurements = sizes.measure();
        assert_eq!(measurements.len(), 4);
        let stat = |name: &str| {
            measurements
                .iter()
                .find(|m| m.id.tags().get("statistic") == Some(name))
                .map(|m| m.value)
        };
        assert_eq!(stat("count"), Some(2.0));
        assert_eq!(stat("totalAmount"), Some(400.0));
        assert_eq!(stat("totalOfSquares"), Some(100_000.0));
        assert_eq!(stat("max"), Some(300.0));

        assert!(sizes.measure().is_empty());
    }

    #[test]
    fn idle_summary_reports_nothing() {
        assert!(summary("request.size").measure().is_empty());
    }
}
