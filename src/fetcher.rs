use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;

/// Outbound half of the page host: hands a JSON body to the network and
/// returns immediately.
///
/// `Err` means the request could not be issued at all. The response, once the
/// request is on its way, is never reported back.
pub trait Transport {
    fn post_json(&self, path: &str, body: Vec<u8>) -> anyhow::Result<()>;
}

/// [`Transport`] over `reqwest`, one detached tokio task per request.
///
/// Tasks outlive the transport: dropping it (or giving up in [`settle`]) only
/// forgets the handles.
///
/// [`settle`]: HttpTransport::settle
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    runtime: Handle,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpTransport {
    /// Must be called from within a tokio runtime; requests are spawned onto it.
    pub fn new(base_url: Url, user_agent: &str) -> anyhow::Result<Self> {
        let runtime = Handle::try_current().context("outbound requests need a tokio runtime")?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url,
            runtime,
            in_flight: Mutex::new(Vec::new()),
        })
    }

    /// Waits up to `limit` for requests still on the wire and returns how many
    /// were pending. Hosts call this before shutting down; listeners never do.
    pub async fn settle(&self, limit: Duration) -> usize {
        let mut pending = match self.in_flight.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => return 0,
        };
        let count = pending.len();

        let drained = tokio::time::timeout(limit, async {
            for handle in pending.iter_mut() {
                let _ = handle.await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                remaining = pending.iter().filter(|h| !h.is_finished()).count(),
                limit_ms = limit.as_millis(),
                "stopped waiting for outstanding requests"
            );
        }
        count
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, path: &str, body: Vec<u8>) -> anyhow::Result<()> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("resolve {path} against {}", self.base_url))?;

        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        let task = async move {
            match request.send().await {
                Ok(resp) => tracing::debug!(%url, status = %resp.status(), "POST finished"),
                Err(err) => tracing::debug!(%url, error = %err, "POST failed"),
            }
        };

        let handle = self.runtime.spawn(task);
        let mut handles = self
            .in_flight
            .lock()
            .map_err(|_| anyhow::anyhow!("in-flight request list poisoned"))?;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }
}
