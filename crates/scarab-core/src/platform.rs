//! Platform detection and the client environment snapshot.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Viewports narrower than this are treated as mobile regardless of UA.
pub const MOBILE_VIEWPORT_CUTOFF: u32 = 768;

static MOBILE_UA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("mobile UA pattern is valid")
});

/// The device class the page is being viewed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Desktop,
    Mobile,
}

impl Platform {
    /// Classifies the client from its user agent and viewport width.
    pub fn detect(user_agent: &str, viewport_width: u32) -> Platform {
        if MOBILE_UA.is_match(user_agent) || viewport_width < MOBILE_VIEWPORT_CUTOFF {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

/// Viewport orientation, derived from the viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Snapshot of the client environment, captured once at page open and
/// attached to telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub pixel_ratio: f64,
    pub language: String,
    pub referrer: Option<String>,
}

impl ClientEnvironment {
    /// The platform classification for this environment.
    pub fn platform(&self) -> Platform {
        Platform::detect(&self.user_agent, self.viewport_width)
    }

    /// `WxH` viewport string as the collector expects it.
    pub fn viewport_size(&self) -> String {
        format!("{}x{}", self.viewport_width, self.viewport_height)
    }

    pub fn orientation(&self) -> Orientation {
        if self.viewport_width > self.viewport_height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// The referrer, or `direct` when the page was opened without one.
    pub fn referrer_or_direct(&self) -> &str {
        self.referrer.as_deref().unwrap_or("direct")
    }
}

impl Default for ClientEnvironment {
    fn default() -> Self {
        Self {
            user_agent: "unknown".to_string(),
            viewport_width: 1280,
            viewport_height: 800,
            pixel_ratio: 1.0,
            language: "unknown".to_string(),
            referrer: None,
        }
    }
}
