//! Experimental condition assignment.
//!
//! Every page open assigns the visitor to one of three conditions. A valid
//! `condition` query parameter forces the assignment (used for QA and for
//! pre-assigned links); anything else falls back to a uniform random draw.
//! Assignment is not sticky across reloads — see DESIGN.md.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The experimental variant a visitor is assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Neutral "in stock" message
    Control,
    /// Visible countdown, offer expires when it reaches zero
    Time,
    /// "Only N units left" message
    Quantity,
}

impl Condition {
    /// All conditions, in the order the random draw indexes them.
    pub const ALL: [Condition; 3] = [Condition::Control, Condition::Time, Condition::Quantity];
}

/// How the condition was decided for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    /// Forced via the `condition` query parameter
    Param,
    /// Uniform random draw
    Random,
}

/// Assigns a condition for this page open.
///
/// A `url_param` matching one of `control`/`time`/`quantity` wins verbatim.
/// Unknown values are ignored and the draw proceeds as if no parameter was
/// given.
pub fn assign(url_param: Option<&str>, rng: &mut impl Rng) -> (Condition, AssignmentSource) {
    if let Some(raw) = url_param {
        if let Ok(forced) = raw.parse::<Condition>() {
            return (forced, AssignmentSource::Param);
        }
        tracing::debug!("ignoring invalid condition parameter: {raw}");
    }

    let drawn = Condition::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Condition::Control);
    (drawn, AssignmentSource::Random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_param_override_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        for (raw, expected) in [
            ("control", Condition::Control),
            ("time", Condition::Time),
            ("quantity", Condition::Quantity),
        ] {
            let (condition, source) = assign(Some(raw), &mut rng);
            assert_eq!(condition, expected);
            assert_eq!(source, AssignmentSource::Param);
        }
    }

    #[test]
    fn test_bogus_param_falls_back_to_random() {
        let mut rng = StdRng::seed_from_u64(7);
        let (condition, source) = assign(Some("bogus"), &mut rng);
        assert!(Condition::ALL.contains(&condition));
        assert_eq!(source, AssignmentSource::Random);
    }

    #[test]
    fn test_random_draw_reaches_all_conditions() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let (condition, source) = assign(None, &mut rng);
            assert_eq!(source, AssignmentSource::Random);
            seen.insert(condition);
        }
        assert_eq!(seen.len(), 3, "uniform draw should reach every condition");
    }

    #[test]
    fn test_wire_names_are_lowercase() {
        assert_eq!(Condition::Quantity.to_string(), "quantity");
        assert_eq!(
            serde_json::to_string(&Condition::Time).unwrap(),
            "\"time\""
        );
    }
}
