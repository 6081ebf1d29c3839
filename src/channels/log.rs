use super::traits::Channel;
use crate::error::NotifierError;
use async_trait::async_trait;

/// Dry-run channel: logs each message instead of sending it.
#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &str, recipient: &str) -> Result<(), NotifierError> {
        tracing::info!(recipient, "dry run, not sending:\n{message}");
        Ok(())
    }
}
