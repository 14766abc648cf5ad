use form_spec::FormVersion;
use tokio::task::JoinHandle;

use crate::client::FormClient;
use crate::error::ClientError;

/// Result of waiting on a schema load.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(FormVersion),
    Failed(ClientError),
    /// The fetch was aborted or superseded. Not an error.
    Cancelled,
}

struct InFlight {
    version_id: u64,
    cancelled: bool,
    handle: JoinHandle<Result<FormVersion, ClientError>>,
}

/// Fetches form versions on the Tokio runtime, one at a time.
///
/// Requesting a different version aborts the fetch in flight; requesting
/// the same version keeps the pending fetch, finished or not, until
/// [`SchemaLoader::wait`] collects it. Dropping the loader aborts whatever is
/// still running. Must be used from within a Tokio runtime.
pub struct SchemaLoader {
    client: FormClient,
    in_flight: Option<InFlight>,
    last_requested: Option<u64>,
}

impl SchemaLoader {
    pub fn new(client: FormClient) -> Self {
        Self {
            client,
            in_flight: None,
            last_requested: None,
        }
    }

    pub fn request(&mut self, version_id: u64) {
        if let Some(in_flight) = &self.in_flight
            && in_flight.version_id == version_id
            && !in_flight.cancelled
        {
            tracing::debug!(version = version_id, "fetch already requested");
            return;
        }
        self.start(version_id);
    }

    /// Re-fetches the last requested version. Returns `false` if nothing
    /// was ever requested.
    pub fn retry(&mut self) -> bool {
        match self.last_requested {
            Some(version_id) => {
                self.start(version_id);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(in_flight) = &mut self.in_flight {
            tracing::debug!(version = in_flight.version_id, "cancelling schema fetch");
            in_flight.handle.abort();
            in_flight.cancelled = true;
        }
    }

    pub fn in_flight_version(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|in_flight| in_flight.version_id)
    }

    pub fn last_requested(&self) -> Option<u64> {
        self.last_requested
    }

    /// Waits for the current fetch. With nothing in flight this reports
    /// [`LoadOutcome::Cancelled`].
    pub async fn wait(&mut self) -> LoadOutcome {
        let Some(in_flight) = self.in_flight.take() else {
            return LoadOutcome::Cancelled;
        };
        match in_flight.handle.await {
            Ok(Ok(version)) => LoadOutcome::Loaded(version),
            Ok(Err(err)) => {
                tracing::warn!(version = in_flight.version_id, error = %err, "schema load failed");
                LoadOutcome::Failed(err)
            }
            Err(err) if err.is_cancelled() => LoadOutcome::Cancelled,
            Err(err) => LoadOutcome::Failed(ClientError::Task(err)),
        }
    }

    fn start(&mut self, version_id: u64) {
        if let Some(previous) = self.in_flight.take() {
            previous.handle.abort();
        }
        let client = self.client.clone();
        let handle = tokio::spawn(async move { client.fetch_version(version_id).await });
        self.in_flight = Some(InFlight {
            version_id,
            cancelled: false,
            handle,
        });
        self.last_requested = Some(version_id);
    }
}

impl Drop for SchemaLoader {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
