//! Experiment phase derivation.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::condition::Condition;

/// Where in the experiment flow the session currently is.
///
/// Attached to every event envelope so the collector can segment events
/// without replaying the session. `TimedThresholdReached` is never derived;
/// it is stamped onto the one event the dwell gate emits when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExperimentPhase {
    ProductViewing,
    ActiveTimer,
    PreExit,
    PostConversion,
    TimedThresholdReached,
}

impl ExperimentPhase {
    /// Derives the phase from session flags. Precedence: conversion beats
    /// pre-exit beats the running countdown beats the default.
    pub fn derive(
        cart_clicked: bool,
        continue_enabled: bool,
        condition: Condition,
        countdown_running: bool,
    ) -> Self {
        if cart_clicked {
            ExperimentPhase::PostConversion
        } else if continue_enabled {
            ExperimentPhase::PreExit
        } else if condition == Condition::Time && countdown_running {
            ExperimentPhase::ActiveTimer
        } else {
            ExperimentPhase::ProductViewing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_wins_over_everything() {
        let phase = ExperimentPhase::derive(true, true, Condition::Time, true);
        assert_eq!(phase, ExperimentPhase::PostConversion);
    }

    #[test]
    fn test_pre_exit_after_continue_enabled() {
        let phase = ExperimentPhase::derive(false, true, Condition::Time, true);
        assert_eq!(phase, ExperimentPhase::PreExit);
    }

    #[test]
    fn test_active_timer_only_for_time_condition() {
        assert_eq!(
            ExperimentPhase::derive(false, false, Condition::Time, true),
            ExperimentPhase::ActiveTimer
        );
        assert_eq!(
            ExperimentPhase::derive(false, false, Condition::Quantity, true),
            ExperimentPhase::ProductViewing
        );
    }

    #[test]
    fn test_default_phase() {
        assert_eq!(
            ExperimentPhase::derive(false, false, Condition::Control, false),
            ExperimentPhase::ProductViewing
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            ExperimentPhase::TimedThresholdReached.to_string(),
            "timed_threshold_reached"
        );
        assert_eq!(ExperimentPhase::ActiveTimer.to_string(), "active_timer");
    }
}
