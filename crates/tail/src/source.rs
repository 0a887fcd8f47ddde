use async_trait::async_trait;

use tailboard_core::error::CoreError;
use tailboard_core::progressive::ProgressiveChunk;
use tailboard_core::target::TailTarget;

use crate::relay::RelayClient;

/// Where a [`crate::tailer::Tailer`] reads log chunks from.
#[async_trait]
pub trait LogSource: Send + Sync + 'static {
    /// Fetch everything the target has logged since byte `offset`.
    async fn fetch(&self, target: &TailTarget, offset: u64) -> Result<ProgressiveChunk, CoreError>;
}

#[async_trait]
impl LogSource for RelayClient {
    async fn fetch(&self, target: &TailTarget, offset: u64) -> Result<ProgressiveChunk, CoreError> {
        Ok(self.progressive_text(target, offset).await?)
    }
}
