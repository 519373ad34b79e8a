use async_trait::async_trait;

use crate::events::{DirectoryEvent, Listener};

/// Emits every event as a `tracing` event under `authgate::events`.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &DirectoryEvent) {
        tracing::info!(
            target: "authgate::events",
            event_name = event.name(),
            ?event,
            "directory event"
        );
    }
}
