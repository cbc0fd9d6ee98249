use std::any::Any;
use std::sync::Arc;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// Reports the delta of an externally maintained, ever-increasing value, such
/// as a kernel or hardware counter the process can only observe.
///
/// Both the latest value and the baseline start as NaN: the first poll only
/// establishes a baseline, and a value that moved backwards (source restart)
/// rebases silently without emitting.
#[derive(Clone, Debug)]
pub struct MonotonicCounter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: Arc<Id>,
    value: AtomicF64,
    previous: AtomicF64,
}

impl MonotonicCounter {
    pub(crate) fn new(id: Arc<Id>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                value: AtomicF64::new(f64::NAN),
                previous: AtomicF64::new(f64::NAN),
            }),
        }
    }

    /// Record the latest observed absolute value.
    pub fn set(&self, amount: f64) {
        self.inner.value.store(amount);
    }

    /// Latest absolute value observed, if any.
    pub fn value(&self) -> Option<f64> {
        let value = self.inner.value.load();
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

impl Meter for MonotonicCounter {
    fn meter_id(&self) -> &Arc<Id> {
        &self.inner.id
    }

    fn measure(&self) -> Measurements {
        let value = self.inner.value.load();
        let previous = self.inner.previous.swap(value);
        let delta = value - previous;
        // NaN baselines and backwards movement both fail this test, so the
        // poll that rebases emits nothing.
        if delta > 0.0 {
            smallvec![Measurement::new(self.inner.id.with_stat("count"), delta)]
        } else {
            Measurements::new()
        }
    }

    fn meter_type(&self) -> MeterType {
        MeterType::MonotonicCounter
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
