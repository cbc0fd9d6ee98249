use std::any::Any;
use std::sync::Arc;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// Holds the last value set during the interval. NaN is the "nothing set"
/// sentinel; the poll that extracts a value also restores it, so a gauge
/// nobody touched stays silent.
#[derive(Clone, Debug)]
pub struct Gauge {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: Arc<Id>,
    value: AtomicF64,
}

impl Gauge {
    pub(crate) fn new(id: Arc<Id>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                value: AtomicF64::new(f64::NAN),
            }),
        }
    }

    pub fn set(&self, value: f64) {
        self.inner.value.store(value);
    }

    /// Last value set since the previous poll, if any.
    pub fn value(&self) -> Option<f64> {
        let value = self.inner.value.load();
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

impl Meter for Gauge {
    fn meter_id(&self) -> &Arc<Id> {
        &self.inner.id
    }

    fn measure(&self) -> Measurements {
        let value = self.inner.value.swap(f64::NAN);
        if value.is_nan() {
            return Measurements::new();
        }
        smallvec![Measurement::new(self.inner.id.with_stat("gauge"), value)]
    }

    fn meter_type(&self) -> MeterType {
        MeterType::Gauge
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
