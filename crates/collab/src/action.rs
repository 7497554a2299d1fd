//! Dry-run action trigger.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::traits::ActionTrigger;

/// Logs requested actions instead of submitting them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingActionTrigger;

#[async_trait]
impl ActionTrigger for LoggingActionTrigger {
    async fn trigger_action(&self, name: &str, decision_task_id: &str) -> Result<()> {
        info!("Would trigger action {} on decision task {}", name, decision_task_id);
        Ok(())
    }
}
