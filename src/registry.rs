use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::id::{Id, IntoId, Tags};
use crate::measurement::Measurement;
use crate::meters::{
    Counter, DistributionSummary, Gauge, MaxGauge, Meter, MonotonicCounter, Timer,
};
use crate::publisher::Publisher;
use crate::transport::{HttpTransport, Transport};

/// Owns every live meter and the background publisher. Cloning a `Registry`
/// is cheap; all clones share the same meter map.
///
/// Get-or-create calls never fail observably. Meters live for the registry's
/// lifetime; there is no deletion.
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    config: Config,
    meters: Mutex<HashMap<Arc<Id>, Arc<dyn Meter>>>,
    publisher: Publisher,
}

impl Registry {
    /// Build a registry with the default http transport, configured with the
    /// connect/read timeouts from `config`.
    pub fn new(config: Config) -> Self {
        let transport = Arc::new(HttpTransport::new(
            config.connect_timeout(),
            config.read_timeout(),
        ));
        Self::with_transport(config, transport)
    }

    /// Build a registry around a caller-supplied transport. The transport's
    /// `init`/`shutdown` lifecycle is driven by this registry's publisher.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                meters: Mutex::new(HashMap::new()),
                publisher: Publisher::new(transport),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn create_id(&self, name: impl Into<String>, tags: Tags) -> Arc<Id> {
        Arc::new(Id::new(name, tags))
    }

    pub fn counter(&self, id: impl IntoId) -> Counter {
        self.get_or_create(id.into_id(), Counter::new)
    }

    pub fn gauge(&self, id: impl IntoId) -> Gauge {
        self.get_or_create(id.into_id(), Gauge::new)
    }

    pub fn max_gauge(&self, id: impl IntoId) -> MaxGauge {
        self.get_or_create(id.into_id(), MaxGauge::new)
    }

    pub fn monotonic_counter(&self, id: impl IntoId) -> MonotonicCounter {
        self.get_or_create(id.into_id(), MonotonicCounter::new)
    }

    pub fn timer(&self, id: impl IntoId) -> Timer {
        self.get_or_create(id.into_id(), Timer::new)
    }

    pub fn distribution_summary(&self, id: impl IntoId) -> DistributionSummary {
        self.get_or_create(id.into_id(), DistributionSummary::new)
    }

    /// Drain every meter into a point-in-time snapshot. Meters that saw no
    /// updates since the previous drain contribute nothing. The map lock is
    /// held across the traversal only.
    pub fn measurements(&self) -> Vec<Measurement> {
        let meters = self.inner.meters.lock();
        let mut measurements = Vec::with_capacity(meters.len());
        for meter in meters.values() {
            measurements.extend(meter.measure());
        }
        measurements
    }

    /// Snapshot of all live meter handles.
    pub fn meters(&self) -> Vec<Arc<dyn Meter>> {
        self.inner.meters.lock().values().cloned().collect()
    }

    /// Start the background publisher. Warns and does nothing if the endpoint
    /// is unconfigured or the publisher is already running.
    pub fn start(&self) {
        self.inner.publisher.start(self);
    }

    /// Stop the background publisher, blocking until the worker exits. A
    /// cycle already in flight finishes first, bounded by the transport
    /// timeouts. No-op if the publisher was never started.
    pub fn stop(&self) {
        self.inner.publisher.stop();
    }

    /// Get-or-create under a single map lock: the first insert for an id
    /// wins, and every caller gets that instance back. A request for an id
    /// registered under a different variant logs an error and returns a
    /// detached meter of the requested type; the registered meter stays
    /// untouched and the detached handle is never measured.
    fn get_or_create<M>(&self, id: Arc<Id>, build: fn(Arc<Id>) -> M) -> M
    where
        M: Meter + Clone,
    {
        let mut meters = self.inner.meters.lock();
        match meters.entry(id) {
            Entry::Occupied(entry) => match entry.get().as_any().downcast_ref::<M>() {
                Some(meter) => meter.clone(),
                None => {
                    let detached = build(entry.key().clone());
                    tracing::error!(
                        id = %entry.key(),
                        registered = %entry.get().meter_type(),
                        requested = %detached.meter_type(),
                        "meter already registered with a different type; \
                         returning a detached meter"
                    );
                    detached
                }
            },
            Entry::Vacant(entry) => {
                let meter = build(entry.key().clone());
                entry.insert(Arc::new(meter.clone()));
                meter
            }
        }
    }
}
