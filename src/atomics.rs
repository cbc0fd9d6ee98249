use std::sync::atomic::{AtomicU64, Ordering};

/// An f64 stored as its bit pattern in an [`AtomicU64`]. Meter state only
/// needs atomicity of each individual read-modify-write, not ordering against
/// other memory, so everything is relaxed.
#[derive(Debug)]
pub(crate) struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub(crate) fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Replace the stored value, returning the previous one. This is the
    /// single indivisible step behind every meter's extract-and-reset.
    pub(crate) fn swap(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::Relaxed))
    }

    /// Add `delta` via a compare-and-set loop.
    pub(crate) fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Raise the stored value to `value` if it is greater.
    pub(crate) fn max(&self, value: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        while value > f64::from_bits(current) {
            match self.bits.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}
