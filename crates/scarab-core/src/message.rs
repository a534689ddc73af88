//! Condition-specific scarcity messaging.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::countdown::format_mm_ss;

/// Units remaining claimed by the quantity-scarcity message.
pub const QUANTITY_UNITS_LEFT: u32 = 3;

/// Message shown once the time-limited offer has run out.
pub const EXPIRED_MESSAGE: &str = "Offer expired!";

/// Visual treatment of the scarcity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScarcityTone {
    Standard,
    QuantityLimited,
    TimeLimited,
}

/// The one scarcity message rendered for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScarcityMessage {
    pub condition: Condition,
    pub text: String,
    pub tone: ScarcityTone,
    /// Whether the slot should announce updates to assistive tech.
    pub live_region: bool,
}

impl ScarcityMessage {
    /// Builds the message for the assigned condition. For the time
    /// condition the text embeds the initial countdown display.
    pub fn for_condition(condition: Condition, countdown_secs: u32) -> Self {
        match condition {
            Condition::Control => Self {
                condition,
                text: "✓ In Stock & Ready to Ship".to_string(),
                tone: ScarcityTone::Standard,
                live_region: false,
            },
            Condition::Quantity => Self {
                condition,
                text: format!("Limited stock! Only {QUANTITY_UNITS_LEFT} units left!"),
                tone: ScarcityTone::QuantityLimited,
                live_region: true,
            },
            Condition::Time => Self {
                condition,
                text: format!(
                    "Limited-time offer ends in: {}",
                    format_mm_ss(countdown_secs)
                ),
                tone: ScarcityTone::TimeLimited,
                live_region: true,
            },
        }
    }
}
