use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::id::Tags;
use crate::registry::{Registry, RegistryInner};
use crate::transport::Transport;
use crate::wire;

/// Counter bumped by the publisher for every measurement the aggregator
/// acknowledged.
const SENT_COUNTER: &str = "spectator.measurementsSent";
/// Counter bumped, tagged with the http status, for measurements the
/// aggregator rejected. Their source meters were already reset during
/// extraction, so the data is permanently lost.
const ERR_COUNTER: &str = "spectator.measurementsErr";

#[derive(Debug, thiserror::Error)]
pub(crate) enum PublishError {
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Background worker owned by a registry. Started at most once; each tick
/// drains the registry, encodes batches, posts them, and records the outcome
/// back into the same registry.
pub(crate) struct Publisher {
    transport: Arc<dyn Transport>,
    started: AtomicBool,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: thread::JoinHandle<()>,
}

impl Publisher {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            started: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub(crate) fn start(&self, registry: &Registry) {
        if registry.config().uri.is_empty() {
            tracing::warn!("registry config has no uri; ignoring start request");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("publisher already started; ignoring start request");
            return;
        }
        self.transport.init();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let weak = Arc::downgrade(&registry.inner);
        let transport = Arc::clone(&self.transport);
        let spawned = thread::Builder::new()
            .name("spectator-publisher".into())
            .spawn(move || worker_loop(weak, transport, shutdown_rx));
        match spawned {
            Ok(handle) => *self.worker.lock() = Some(Worker { shutdown, handle }),
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn publisher worker");
                self.transport.shutdown();
                self.started.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Signal the worker, block until it exits, then shut the transport down.
    /// Returns immediately if the publisher never started.
    pub(crate) fn stop(&self) {
        if !self.started.load(Ordering::SeqCst) {
            return;
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.shutdown.send(true);
            if worker.handle.join().is_err() {
                tracing::error!("publisher worker panicked before exiting");
            }
            self.transport.shutdown();
        }
    }
}

/// Runs on the dedicated publisher thread, hosting a current-thread runtime
/// for the transport. Cancellation is cooperative: the stop flag is examined
/// only at the top of each iteration, so an in-flight cycle always finishes.
fn worker_loop(
    registry: Weak<RegistryInner>,
    transport: Arc<dyn Transport>,
    mut shutdown: watch::Receiver<bool>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to build publisher runtime");
            return;
        }
    };
    runtime.block_on(async move {
        loop {
            if *shutdown.borrow() {
                break;
            }
            // The worker only holds a weak handle; when every user-facing
            // clone of the registry is gone there is nothing left to drain.
            let Some(inner) = registry.upgrade() else {
                break;
            };
            let registry = Registry::from_inner(inner);
            let interval = registry.config().send_interval();
            let start = Instant::now();
            match send_cycle(&registry, transport.as_ref()).await {
                Ok(sent) => {
                    tracing::debug!(measurements = sent, elapsed = ?start.elapsed(), "completed send cycle");
                }
                Err(err) => {
                    tracing::error!(error = %err, "ignoring send cycle failure");
                }
            }
            drop(registry);

            // Overrun intervals shorten the wait to zero; there is no
            // catch-up of missed cycles.
            let elapsed = start.elapsed();
            if elapsed < interval {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(interval - elapsed) => {}
                }
            }
        }
        tracing::info!("stopping publisher");
    });
}

/// One drain-encode-post pass. Returns the number of measurements the
/// aggregator acknowledged. Failures are contained by the caller: the worker
/// logs them and keeps its schedule.
pub(crate) async fn send_cycle(
    registry: &Registry,
    transport: &dyn Transport,
) -> Result<usize, PublishError> {
    let config = registry.config();
    let measurements = registry.measurements();
    if measurements.is_empty() {
        return Ok(0);
    }

    let batch_size = config.batch_size.max(1);
    let mut payloads = Vec::with_capacity(measurements.len().div_ceil(batch_size));
    let mut batch_lens = Vec::with_capacity(payloads.capacity());
    for batch in measurements.chunks(batch_size) {
        payloads.push(wire::encode_batch(&config.common_tags, batch)?);
        batch_lens.push(batch.len());
    }

    let statuses = transport.post_batches(&config.uri, payloads).await;
    let mut sent = 0;
    for (status, len) in statuses.into_iter().zip(batch_lens) {
        if status == 200 {
            sent += len;
            registry.counter(SENT_COUNTER).add(len as f64);
        } else {
            tracing::error!(
                status,
                measurements = len,
                "unable to send batch of measurements"
            );
            let mut tags = Tags::new();
            tags.add("error", "httpError");
            tags.add("statusCode", status.to_string());
            registry
                .counter(registry.create_id(ERR_COUNTER, tags))
                .add(len as f64);
        }
    }
    Ok(sent)
}
