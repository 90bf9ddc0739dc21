//! Polling watcher that tracks the live tool list.

use super::{BridgeClient, BridgeClientError};
use crate::bridge::domain::BridgeTool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background poller publishing the bridge's tool list on a watch channel.
///
/// Receivers are only woken when the list actually changes. A rejected token
/// clears the list and stops the watcher; other failures keep the last known
/// list and retry on the next tick.
#[derive(Debug)]
pub struct ToolWatcher {
    tools: watch::Receiver<Vec<BridgeTool>>,
    handle: JoinHandle<()>,
}

impl ToolWatcher {
    /// Starts polling `client` every `interval` until `cancel` fires.
    #[must_use]
    pub fn spawn(client: BridgeClient, interval: Duration, cancel: CancellationToken) -> Self {
        let (sender, tools) = watch::channel(Vec::new());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match client.list_tools().await {
                    Ok(latest) => {
                        sender.send_if_modified(|current| {
                            if *current == latest {
                                return false;
                            }
                            tracing::info!(tools = latest.len(), "bridge tool list changed");
                            *current = latest;
                            true
                        });
                    }
                    Err(BridgeClientError::Unauthorized(message)) => {
                        tracing::warn!(reason = %message, "bridge token rejected; stopping watcher");
                        sender.send_modify(Vec::clear);
                        break;
                    }
                    Err(err) => {
                        tracing::debug!(err = %err, "bridge tool poll failed");
                    }
                }
            }
        });
        Self { tools, handle }
    }

    /// Returns the most recently observed tool list.
    #[must_use]
    pub fn current(&self) -> Vec<BridgeTool> {
        self.tools.borrow().clone()
    }

    /// Returns a receiver that is notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<BridgeTool>> {
        self.tools.clone()
    }

    /// Waits for the poller to stop.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            tracing::warn!(err = %err, "bridge tool watcher panicked");
        }
    }
}
