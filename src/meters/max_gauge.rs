use std::any::Any;
use std::sync::Arc;

use smallvec::smallvec;

use super::{Measurements, Meter, MeterType};
use crate::atomics::AtomicF64;
use crate::id::Id;
use crate::measurement::Measurement;

/// Sentinel for "no update this interval". Swapped back in by every poll, so
/// a single atomic read-and-replace distinguishes idle from reported.
const UNSET: f64 = f64::MIN;

/// Tracks the running maximum of the values seen during the interval.
#[derive(Clone, Debug)]
pub struct MaxGauge {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: Arc<Id>,
    value: AtomicF64,
}

impl MaxGauge {
    pub(crate) fn new(id: Arc<Id>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                value: AtomicF64::new(UNSET),
            }),
        }
    }

    /// Raise the tracked maximum to `value` if it is greater.
    pub fn update(&self, value: f64) {
        self.inner.value.max(value);
    }

    pub fn set(&self, value: f64) {
        self.update(value);
    }

    /// Maximum seen since the last poll, if any.
    pub fn value(&self) -> Option<f64> {
        let value = self.inner.value.load();
        if value == UNSET {
            None
        } else {
            Some(value)
        }
    }
}

impl Meter for MaxGauge {
    fn meter_id(&self) -> &Arc<Id> {
        &self.inner.id
    }

    fn measure(&self) -> Measurements {
        let value = self.inner.value.swap(UNSET);
        if value == UNSET {
            return Measurements::new();
        }
        smallvec![Measurement::new(self.inner.id.with_stat("max"), value)]
    }

    fn meter_type(&self) -> MeterType {
        MeterType::MaxGauge
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
