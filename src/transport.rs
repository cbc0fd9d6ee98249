use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;

/// Where encoded batches go. The crate ships [`HttpTransport`]; tests and
/// embedders can provide their own through
/// [`Registry::with_transport`](crate::Registry::with_transport).
///
/// `init` and `shutdown` bracket the publisher lifecycle: the first effective
/// `start()` of the owning publisher calls `init` once, and `stop()` calls
/// `shutdown`. Registries sharing one transport instance must coordinate
/// those calls themselves.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    fn init(&self) {}

    fn shutdown(&self) {}

    /// Post one payload per batch, returning one http status per batch in the
    /// same order. Transport-level failures map to status `0`, which the
    /// publisher accounts like any other non-200.
    async fn post_batches(&self, uri: &str, payloads: Vec<String>) -> Vec<u16>;
}

/// Default [`Transport`]: one POST per batch with a shared connection pool.
pub struct HttpTransport {
    connect_timeout: Duration,
    read_timeout: Duration,
    client: OnceLock<Option<reqwest::Client>>,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Option<&reqwest::Client> {
        self.client
            .get_or_init(|| {
                reqwest::Client::builder()
                    .connect_timeout(self.connect_timeout)
                    .timeout(self.read_timeout)
                    .build()
                    .map_err(|err| {
                        tracing::error!(error = %err, "failed to build http client")
                    })
                    .ok()
            })
            .as_ref()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn init(&self) {
        let _ = self.client();
    }

    async fn post_batches(&self, uri: &str, payloads: Vec<String>) -> Vec<u16> {
        let Some(client) = self.client() else {
            return vec![0; payloads.len()];
        };
        let mut statuses = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let response = client
                .post(uri)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await;
            match response {
                Ok(response) => statuses.push(response.status().as_u16()),
                Err(err) => {
                    tracing::debug!(error = %err, "http post failed");
                    statuses.push(0);
                }
            }
        }
        statuses
    }
}
