//! Inbound page request parsing.
//!
//! The page is opened with query parameters supplied by the recruitment
//! link: `pid` (opaque participant identifier) and optionally `condition`
//! (forced assignment, validated elsewhere). All parameters are kept
//! verbatim for the page-load event.

use std::collections::BTreeMap;

use url::Url;

/// Participant ID recorded when the link carried none.
pub const DEFAULT_PARTICIPANT_ID: &str = "missing_pid";

/// Parsed inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub participant_id: String,
    /// Raw `condition` parameter, if present; validation happens at
    /// assignment time so invalid values can fall back to the random draw.
    pub condition_param: Option<String>,
    pub raw_params: BTreeMap<String, String>,
}

impl PageRequest {
    /// Parses a full URL, a `?`-prefixed query, or a bare query string.
    pub fn parse(input: &str) -> Self {
        let query = extract_query(input);
        let raw_params: BTreeMap<String, String> =
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();

        let participant_id = raw_params
            .get("pid")
            .filter(|pid| !pid.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_PARTICIPANT_ID.to_string());
        let condition_param = raw_params.get("condition").cloned();

        Self {
            participant_id,
            condition_param,
            raw_params,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::parse("")
    }
}

fn extract_query(input: &str) -> String {
    let trimmed = input.trim();
    if let Ok(parsed) = Url::parse(trimmed) {
        return parsed.query().unwrap_or("").to_string();
    }
    trimmed.trim_start_matches('?').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url() {
        let request =
            PageRequest::parse("https://shop.example/product?pid=abc123&condition=time&x=1");
        assert_eq!(request.participant_id, "abc123");
        assert_eq!(request.condition_param.as_deref(), Some("time"));
        assert_eq!(request.raw_params.get("x").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_bare_query_string() {
        let request = PageRequest::parse("pid=p%20q&condition=quantity");
        assert_eq!(request.participant_id, "p q", "values are percent-decoded");
        assert_eq!(request.condition_param.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_question_mark_prefix() {
        let request = PageRequest::parse("?pid=xyz");
        assert_eq!(request.participant_id, "xyz");
        assert!(request.condition_param.is_none());
    }

    #[test]
    fn test_missing_pid_defaults() {
        let request = PageRequest::parse("condition=control");
        assert_eq!(request.participant_id, DEFAULT_PARTICIPANT_ID);
    }

    #[test]
    fn test_empty_input() {
        let request = PageRequest::default();
        assert_eq!(request.participant_id, DEFAULT_PARTICIPANT_ID);
        assert!(request.raw_params.is_empty());
    }
}
