//! Telemetry event vocabulary and the wire envelope.
//!
//! Every user-visible action becomes one `Envelope`, serialized camelCase
//! and POSTed to the collector. The collector accepts free-form additional
//! fields and keys derived storage on `action`/`timestamp`/`pid`, so the
//! envelope carries a fixed enriched core plus per-event `details`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;
use uuid::Uuid;

use crate::condition::Condition;
use crate::content::ExpandedSections;
use crate::error::Result;
use crate::platform::{ClientEnvironment, Orientation, Platform};
use crate::session::{CartStatus, ExperimentPhase, Session};

/// Top-level event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Action {
    PageLoad,
    TimeThreshold,
    ContinueButtonEnabled,
    TimerExpired,
    Conversion,
    ContentExpand,
    PageExit,
    ProductDetailsFocus,
}

/// Secondary event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SubAction {
    ExperimentStart,
    MinViewTimeReached,
    AddToCart,
    AccordionOpen,
    FaqOpen,
    SurveyRedirect,
    BrowserUnload,
}

/// One serialized telemetry event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub pid: String,
    pub platform: Platform,
    pub condition: Condition,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_action: Option<SubAction>,
    /// ISO-8601 with millisecond precision
    pub timestamp: String,
    pub event_id: String,
    /// Whole seconds since page load
    pub time_on_page: i64,
    /// Monotonic per-session counter, one bump per logged event
    pub interaction_sequence: u32,
    pub experiment_phase: ExperimentPhase,
    pub cart_status: CartStatus,
    pub cart_clicked: bool,
    pub viewport_size: String,
    pub device_orientation: Orientation,
    pub expanded_sections: ExpandedSections,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Envelope {
    /// Builds the enriched envelope for one event.
    ///
    /// Bumps the session interaction counter, so envelopes must be created
    /// in the order their events happened.
    pub fn new(
        session: &mut Session,
        environment: &ClientEnvironment,
        expanded_sections: ExpandedSections,
        action: Action,
    ) -> Self {
        Self {
            pid: session.participant_id().to_string(),
            platform: session.platform(),
            condition: session.condition(),
            action,
            sub_action: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event_id: Uuid::new_v4().to_string(),
            time_on_page: session.time_on_page_secs(),
            interaction_sequence: session.next_interaction_sequence(),
            experiment_phase: session.phase(),
            cart_status: session.cart_status(),
            cart_clicked: session.cart_clicked(),
            viewport_size: environment.viewport_size(),
            device_orientation: environment.orientation(),
            expanded_sections,
            details: Map::new(),
        }
    }

    pub fn sub_action(mut self, sub_action: SubAction) -> Self {
        self.sub_action = Some(sub_action);
        self
    }

    /// Overrides the derived phase (the dwell gate stamps
    /// `timed_threshold_reached` on its threshold event).
    pub fn phase(mut self, phase: ExperimentPhase) -> Self {
        self.experiment_phase = phase;
        self
    }

    /// Attaches a free-form detail field.
    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Delivery seam for envelopes.
///
/// Implementations are best-effort: the controller never awaits delivery on
/// a UI path and never retries a failure.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, envelope: &Envelope) -> Result<()>;
}
