use async_trait::async_trait;

use crate::events::{DirectoryEvent, Listener};

/// Writes every event to the `log` facade under `authgate::events`.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &DirectoryEvent) {
        log::log!(
            target: "authgate::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}
