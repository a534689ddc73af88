//! Survey redirect URL construction.
//!
//! The terminal navigation of every session. All session summary values are
//! appended as URL-encoded query parameters; the survey tool joins them
//! back to the telemetry stream via `pid`.

use url::Url;

use crate::error::{Result, ScarabError};
use crate::session::Session;

/// Builds the post-survey redirect URL for a finished session.
///
/// `time_on_page` is passed explicitly because the caller computes the
/// session duration once and reports the same number on the exit event.
pub fn survey_redirect_url(base: &str, session: &Session, time_on_page: i64) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|err| ScarabError::config(format!("invalid survey base URL {base}: {err}")))?;
    url.query_pairs_mut()
        .append_pair("pid", session.participant_id())
        .append_pair("platform", &session.platform().to_string())
        .append_pair("condition", &session.condition().to_string())
        .append_pair("cartStatus", &session.cart_status().to_string())
        .append_pair("timeOnPage", &time_on_page.to_string())
        .append_pair("interactionCount", &session.interaction_count().to_string());
    Ok(url.into())
}
