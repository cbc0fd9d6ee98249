use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// Records how long something took and how often it happened. Durations are
/// reported in seconds. Each poll drains four accumulators together: count,
/// totalTime and totalOfSquares aggregate server-side with Add, max with Max.
#[derive(Clone, Debug)]
pub struct Timer {
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

impl Timer {
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

    /// Record one duration sample.
    pub fn record(&self, duration: Duration) {
        let seconds = duration.as_secs_f64();
        self.inner.count.fetch_add(1, Ordering::Relaxed);
        self.inner.total.add(seconds);
        self.inner.total_sq.add(seconds * seconds);
        self.inner.max.max(seconds);
    }

    /// Samples recorded since the last poll.
    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Sum of the recorded durations since the last poll, in seconds.
    pub fn total_time(&self) -> f64 {
        self.inner.total.load()
    }
}

impl Meter for Timer {
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
            Measurement::new(self.inner.id.with_stat("totalTime"), total),
            Measurement::new(self.inner.id.with_stat("totalOfSquares"), total_sq),
            Measurement::new(self.inner.id.with_stat("max"), max),
        ]
    }

    fn meter_type(&self) -> MeterType {
        MeterType::Timer
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
