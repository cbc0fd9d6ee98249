use std::any::Any;
use std::sync::Arc;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// A rate meter. Updates accumulate between polls; each poll reports the
/// accumulated delta and returns the counter to zero.
#[derive(Clone, Debug)]
pub struct Counter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: Arc<Id>,
    value: AtomicF64,
}

impl Counter {
    pub(crate) fn new(id: Arc<Id>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                value: AtomicF64::new(0.0),
            }),
        }
    }

    pub fn increment(&self) {
        self.add(1.0);
    }

    /// Add `delta` to the accumulator. Negative deltas are ignored; a counter
    /// only moves forward within an interval.
    pub fn add(&self, delta: f64) {
        if delta > 0.0 {
            self.inner.value.add(delta);
        }
    }

    /// Accumulated value since the last poll, without resetting it.
    pub fn count(&self) -> f64 {
        self.inner.value.load()
    }
}

impl Meter for Counter {
    fn meter_id(&self) -> &Arc<Id> {
        &self.inner.id
    }

    fn measure(&self) -> Measurements {
        let value = self.inner.value.swap(0.0);
        if value == 0.0 {
            return Measurements::new();
        }
        smallvec![Measurement::new(self.inner.id.with_stat("count"), value)]
    }

    fn meter_type(&self) -> MeterType {
        MeterType::Counter
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
