use async_trait::async_trait;

use super::DirectoryEvent;

/// Receives every dispatched [`DirectoryEvent`]. Filter by matching on the variant.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &DirectoryEvent);
}
