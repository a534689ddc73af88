//! Session domain model.
//!
//! One `Session` is created per page open and mutated only through the
//! controller's handlers; nothing survives the page. The two invariants the
//! model itself enforces: the assigned condition is immutable, and the
//! continue affordance transitions disabled -> enabled exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::condition::{AssignmentSource, Condition};
use crate::platform::Platform;
use crate::session::phase::ExperimentPhase;

/// Cart outcome as the collector spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Added,
    NotAdded,
}

/// Conversion outcome reported on exit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversionResult {
    Converted,
    Abandoned,
}

/// Per-page-open experiment session state.
#[derive(Debug, Clone)]
pub struct Session {
    participant_id: String,
    platform: Platform,
    condition: Condition,
    assignment: AssignmentSource,
    page_loaded_at: DateTime<Utc>,
    cart_clicked: bool,
    cart_enabled: bool,
    continue_enabled: bool,
    countdown_running: bool,
    interaction_count: u32,
}

impl Session {
    pub fn new(
        participant_id: impl Into<String>,
        platform: Platform,
        condition: Condition,
        assignment: AssignmentSource,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            platform,
            condition,
            assignment,
            page_loaded_at: Utc::now(),
            cart_clicked: false,
            cart_enabled: true,
            continue_enabled: false,
            countdown_running: false,
            interaction_count: 0,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn assignment(&self) -> AssignmentSource {
        self.assignment
    }

    pub fn page_loaded_at(&self) -> DateTime<Utc> {
        self.page_loaded_at
    }

    /// Whole seconds since the page was opened.
    pub fn time_on_page_secs(&self) -> i64 {
        let millis = (Utc::now() - self.page_loaded_at).num_milliseconds();
        (millis as f64 / 1000.0).round() as i64
    }

    // ------------------------------------------------------------------
    // Continue affordance
    // ------------------------------------------------------------------

    /// Marks continue as enabled.
    ///
    /// Returns true only for the first call; the transition happens once
    /// per session no matter how many triggers race to it.
    pub fn enable_continue(&mut self) -> bool {
        if self.continue_enabled {
            return false;
        }
        self.continue_enabled = true;
        true
    }

    pub fn continue_enabled(&self) -> bool {
        self.continue_enabled
    }

    // ------------------------------------------------------------------
    // Add-to-cart affordance
    // ------------------------------------------------------------------

    /// Records the conversion click. Returns false when the control is
    /// already disabled (double submission guard).
    pub fn mark_cart_clicked(&mut self) -> bool {
        if !self.cart_enabled {
            return false;
        }
        self.cart_clicked = true;
        self.cart_enabled = false;
        true
    }

    /// Disables the add-to-cart control without a conversion (timer expiry
    /// or continue enablement).
    pub fn disable_cart(&mut self) {
        self.cart_enabled = false;
    }

    pub fn cart_enabled(&self) -> bool {
        self.cart_enabled
    }

    pub fn cart_clicked(&self) -> bool {
        self.cart_clicked
    }

    pub fn cart_status(&self) -> CartStatus {
        if self.cart_clicked {
            CartStatus::Added
        } else {
            CartStatus::NotAdded
        }
    }

    pub fn conversion_result(&self) -> ConversionResult {
        if self.cart_clicked {
            ConversionResult::Converted
        } else {
            ConversionResult::Abandoned
        }
    }

    // ------------------------------------------------------------------
    // Countdown visibility (phase derivation input)
    // ------------------------------------------------------------------

    pub fn set_countdown_running(&mut self, running: bool) {
        self.countdown_running = running;
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown_running
    }

    /// The phase the session is in, derived from its flags.
    pub fn phase(&self) -> ExperimentPhase {
        ExperimentPhase::derive(
            self.cart_clicked,
            self.continue_enabled,
            self.condition,
            self.countdown_running,
        )
    }

    // ------------------------------------------------------------------
    // Interaction counter
    // ------------------------------------------------------------------

    /// Bumps the interaction counter and returns the new sequence number.
    /// Called once per logged event.
    pub fn next_interaction_sequence(&mut self) -> u32 {
        self.interaction_count += 1;
        self.interaction_count
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "p-1",
            Platform::Desktop,
            Condition::Control,
            AssignmentSource::Random,
        )
    }

    #[test]
    fn test_continue_enables_exactly_once() {
        let mut session = session();
        assert!(!session.continue_enabled());
        assert!(session.enable_continue());
        assert!(!session.enable_continue(), "second transition is a no-op");
        assert!(session.continue_enabled());
    }

    #[test]
    fn test_cart_click_disables_itself() {
        let mut session = session();
        assert!(session.mark_cart_clicked());
        assert!(!session.mark_cart_clicked(), "double submission guarded");
        assert_eq!(session.cart_status(), CartStatus::Added);
        assert_eq!(session.conversion_result(), ConversionResult::Converted);
    }

    #[test]
    fn test_disabled_cart_rejects_click() {
        let mut session = session();
        session.disable_cart();
        assert!(!session.mark_cart_clicked());
        assert_eq!(session.cart_status(), CartStatus::NotAdded);
        assert_eq!(session.conversion_result(), ConversionResult::Abandoned);
    }

    #[test]
    fn test_interaction_sequence_is_monotonic() {
        let mut session = session();
        assert_eq!(session.next_interaction_sequence(), 1);
        assert_eq!(session.next_interaction_sequence(), 2);
        assert_eq!(session.interaction_count(), 2);
    }

    #[test]
    fn test_cart_status_wire_names() {
        assert_eq!(CartStatus::Added.to_string(), "added");
        assert_eq!(CartStatus::NotAdded.to_string(), "not_added");
        assert_eq!(ConversionResult::Abandoned.to_string(), "abandoned");
    }
}
