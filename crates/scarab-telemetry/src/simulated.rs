//! Console-only collector used when no endpoint is configured.

use async_trait::async_trait;

use scarab_core::Result;
use scarab_core::event::{Envelope, EventSink};

/// Logs every envelope instead of transmitting it.
///
/// Stands in for the real collector when `collector_url` is unset so local
/// runs and tests keep the full event flow without a network dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedCollector;

#[async_trait]
impl EventSink for SimulatedCollector {
    async fn deliver(&self, envelope: &Envelope) -> Result<()> {
        tracing::info!(
            action = %envelope.action,
            pid = %envelope.pid,
            payload = %serde_json::to_string(envelope)?,
            "collector URL not configured; logging event (simulated)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scarab_core::condition::{AssignmentSource, Condition};
    use scarab_core::event::Action;
    use scarab_core::platform::{ClientEnvironment, Platform};
    use scarab_core::session::Session;

    #[tokio::test]
    async fn test_simulated_delivery_always_succeeds() {
        let mut session = Session::new(
            "p-1",
            Platform::Desktop,
            Condition::Quantity,
            AssignmentSource::Random,
        );
        let envelope = Envelope::new(
            &mut session,
            &ClientEnvironment::default(),
            Default::default(),
            Action::PageLoad,
        );
        assert!(SimulatedCollector.deliver(&envelope).await.is_ok());
    }
}
