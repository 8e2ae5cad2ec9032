//! Background notification polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::model::Notification;

/// Fetches the notification list every `period` and forwards each result on
/// `rx`. The first fetch happens immediately.
pub struct Poller {
    pub rx: mpsc::UnboundedReceiver<Vec<Notification>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Must be called from inside a tokio runtime.
    pub fn start(backend: Arc<dyn Backend>, period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                }
                match backend.notifications().await {
                    Ok(list) => {
                        debug!(count = list.len(), "notifications polled");
                        if tx.send(list).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "notification poll failed"),
                }
            }
        });

        Self {
            rx,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stops polling and waits for the task to finish.
    pub async fn stop(mut self) {
        self.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}
