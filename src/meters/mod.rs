use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::id::Id;
use crate::measurement::Measurement;

mod counter;
mod distribution_summary;
mod gauge;
mod max_gauge;
mod monotonic_counter;
mod timer;

pub use counter::Counter;
pub use distribution_summary::DistributionSummary;
pub use gauge::Gauge;
pub use max_gauge::MaxGauge;
pub use monotonic_counter::MonotonicCounter;
pub use timer::Timer;

/// A meter emits at most four measurements per poll (Timer and
/// DistributionSummary), so the common case stays off the heap.
pub type Measurements = SmallVec<[Measurement; 4]>;

/// The closed set of meter variants a registry can hold. Used for the
/// type-mismatch diagnostic when a caller asks for the wrong variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterType {
    Counter,
    DistributionSummary,
    Gauge,
    MaxGauge,
    MonotonicCounter,
    Timer,
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeterType::Counter => "counter",
            MeterType::DistributionSummary => "distribution-summary",
            MeterType::Gauge => "gauge",
            MeterType::MaxGauge => "max-gauge",
            MeterType::MonotonicCounter => "monotonic-counter",
            MeterType::Timer => "timer",
        };
        f.write_str(name)
    }
}

/// Common contract over the six meter variants. Update operations are typed
/// methods on the concrete meters; the registry only needs identity,
/// extraction, and enough type information to hand callers back the concrete
/// meter they asked for.
pub trait Meter: Send + Sync + 'static {
    fn meter_id(&self) -> &Arc<Id>;

    /// Atomically extract the state accumulated since the previous poll and
    /// reset to the idle baseline. Idle meters return nothing.
    fn measure(&self) -> Measurements;

    fn meter_type(&self) -> MeterType;

    /// Recover the concrete meter behind a `dyn Meter`. The registry
    /// downcasts through this when a get-or-create call hits an existing
    /// entry.
    fn as_any(&self) -> &dyn Any;
}
