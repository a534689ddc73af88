//! Fire-and-forget event dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use scarab_core::config::PageConfig;
use scarab_core::event::{Envelope, EventSink};

use crate::collector::HttpCollector;
use crate::diagnostics::DiagnosticStore;
use crate::simulated::SimulatedCollector;

/// Routes envelopes to the configured sink without ever blocking a UI path.
///
/// Normal dispatch spawns the delivery and returns immediately; UI state
/// transitions are never ordered relative to network completion. The only
/// awaited path is [`dispatch_final`](Self::dispatch_final), the bounded
/// unload-time flush, because ordinary async delivery is not guaranteed to
/// finish once page teardown begins.
#[derive(Clone)]
pub struct TelemetryDispatcher {
    sink: Arc<dyn EventSink>,
    diagnostics: Option<Arc<DiagnosticStore>>,
}

impl TelemetryDispatcher {
    pub fn new(sink: Arc<dyn EventSink>, diagnostics: Option<Arc<DiagnosticStore>>) -> Self {
        Self { sink, diagnostics }
    }

    /// Picks the HTTP collector when a URL is configured, the console
    /// simulation otherwise, with the default diagnostic location.
    pub fn from_config(config: &PageConfig) -> Self {
        let sink: Arc<dyn EventSink> = match config.collector_url.as_deref() {
            Some(url) => Arc::new(HttpCollector::new(url)),
            None => {
                tracing::warn!("collector URL is not configured; logging to console only");
                Arc::new(SimulatedCollector)
            }
        };
        Self::new(sink, DiagnosticStore::default_location().map(Arc::new))
    }

    /// Best-effort asynchronous delivery; the returned handle is only
    /// useful to tests.
    pub fn dispatch(&self, envelope: Envelope) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let diagnostics = self.diagnostics.clone();
        tokio::spawn(async move {
            deliver_once(sink.as_ref(), diagnostics.as_deref(), &envelope).await;
        })
    }

    /// Awaited delivery for the final exit event, bounded by `limit` so a
    /// slow collector cannot hold up teardown.
    pub async fn dispatch_final(&self, envelope: Envelope, limit: Duration) {
        let outcome =
            tokio::time::timeout(limit, deliver_once(self.sink.as_ref(), self.diagnostics.as_deref(), &envelope))
                .await;
        if outcome.is_err() {
            tracing::warn!(
                event_id = %envelope.event_id,
                "final event flush did not finish within {limit:?}"
            );
        }
    }
}

async fn deliver_once(
    sink: &dyn EventSink,
    diagnostics: Option<&DiagnosticStore>,
    envelope: &Envelope,
) {
    if let Err(err) = sink.deliver(envelope).await {
        tracing::warn!(event_id = %envelope.event_id, "event delivery failed: {err}");
        if let Some(store) = diagnostics {
            if let Err(record_err) = store.record_failure(envelope, &err) {
                tracing::warn!("could not persist diagnostic record: {record_err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scarab_core::condition::{AssignmentSource, Condition};
    use scarab_core::event::Action;
    use scarab_core::platform::{ClientEnvironment, Platform};
    use scarab_core::session::Session;
    use scarab_core::{Result, ScarabError};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn deliver(&self, _envelope: &Envelope) -> Result<()> {
            Err(ScarabError::telemetry("collector unreachable"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, envelope: &Envelope) -> Result<()> {
            self.delivered
                .lock()
                .unwrap()
                .push(envelope.event_id.clone());
            Ok(())
        }
    }

    fn envelope() -> Envelope {
        let mut session = Session::new(
            "p-1",
            Platform::Desktop,
            Condition::Control,
            AssignmentSource::Random,
        );
        Envelope::new(
            &mut session,
            &ClientEnvironment::default(),
            Default::default(),
            Action::PageLoad,
        )
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = TelemetryDispatcher::new(sink.clone(), None);
        dispatcher.dispatch(envelope()).await.unwrap();
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_writes_one_diagnostic_and_stays_silent() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DiagnosticStore::new(dir.path()));
        let dispatcher = TelemetryDispatcher::new(Arc::new(FailingSink), Some(store));

        // The spawned delivery must not propagate the sink error.
        dispatcher.dispatch(envelope()).await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_final_flush_completes_for_fast_sink() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = TelemetryDispatcher::new(sink.clone(), None);
        dispatcher
            .dispatch_final(envelope(), Duration::from_secs(2))
            .await;
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_flush_is_bounded() {
        struct StuckSink;

        #[async_trait]
        impl EventSink for StuckSink {
            async fn deliver(&self, _envelope: &Envelope) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let dispatcher = TelemetryDispatcher::new(Arc::new(StuckSink), None);
        // Completes via the timeout rather than hanging teardown.
        dispatcher
            .dispatch_final(envelope(), Duration::from_millis(500))
            .await;
    }
}
