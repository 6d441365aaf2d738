use std::sync::{Arc, Mutex};

use crate::config::LogOptions;
use crate::constructor::construct;
use crate::har::OutgoingLogBody;
use crate::payload::PayloadData;
use crate::transport::HttpDataSender;

/// Cap on envelopes retained across failed sends; oldest are dropped beyond
/// this.
const MAX_RETAINED_EVENTS: usize = 1024;

/// Accumulates envelopes and flushes them in batches. The buffer is shared
/// and thread-safe; a flush drains it under a single lock so entries are
/// neither double-sent nor lost between concurrent dispatches.
pub struct PayloadDataDispatcher {
    buffer: Arc<Mutex<Vec<OutgoingLogBody>>>,
    sender: Arc<HttpDataSender>,
}

impl PayloadDataDispatcher {
    pub fn new(sender: HttpDataSender) -> Self {
        PayloadDataDispatcher {
            buffer: Arc::new(Mutex::new(Vec::new())),
            sender: Arc::new(sender),
        }
    }

    /// Queues one captured exchange, flushing once the buffer holds
    /// `buffer_length` envelopes. Network I/O runs on a spawned task; the
    /// caller continues immediately. Failures are logged and never reach
    /// the host request path.
    pub fn dispatch(&self, payload: PayloadData, options: &LogOptions) {
        let envelope = match construct(payload, options) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::error!("error occurred on data dispatch phase: {}", e);
                return;
            }
        };

        let batch = {
            let mut buffer = self.buffer.lock().unwrap();
            buffer.push(envelope);
            if buffer.len() < options.buffer_length.max(1) {
                return;
            }
            buffer.drain(..).collect::<Vec<_>>()
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let sender = Arc::clone(&self.sender);
                let buffer = Arc::clone(&self.buffer);
                let options = options.clone();
                handle.spawn(async move {
                    if !sender.send(&batch, &options).await {
                        log::error!("failed to send outgoing log body");
                        requeue(&buffer, batch);
                    }
                });
            }
            Err(_) => {
                log::error!(
                    "no async runtime available, retaining {} events for a later flush",
                    batch.len()
                );
                requeue(&self.buffer, batch);
            }
        }
    }

    /// Drains and sends everything currently buffered, e.g. at shutdown.
    /// On failure the batch is retained like any other failed send.
    pub async fn flush(&self, options: &LogOptions) -> bool {
        let batch = {
            let mut buffer = self.buffer.lock().unwrap();
            buffer.drain(..).collect::<Vec<_>>()
        };
        if batch.is_empty() {
            return true;
        }
        if self.sender.send(&batch, options).await {
            true
        } else {
            requeue(&self.buffer, batch);
            false
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}

/// Failed batches go back to the front so arrival order survives a retry;
/// the retained backlog is bounded, oldest first out.
fn requeue(buffer: &Mutex<Vec<OutgoingLogBody>>, batch: Vec<OutgoingLogBody>) {
    let mut buffer = buffer.lock().unwrap();
    buffer.splice(0..0, batch);
    if buffer.len() > MAX_RETAINED_EVENTS {
        let overflow = buffer.len() - MAX_RETAINED_EVENTS;
        buffer.drain(..overflow);
        log::warn!(
            "telemetry buffer over capacity, dropped {} oldest events",
            overflow
        );
    }
}
