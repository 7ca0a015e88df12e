//! Decide whether a loaded page is an error page.
//!
//! Browsers do not expose the HTTP status of a rendered document, so the
//! status is inferred from the body text.

use serde::{Deserialize, Serialize};

/// Body substrings that mark an error page.
const ERROR_MARKERS: &[&str] = &["404", "Not Found", "Forbidden", "403"];

/// Outcome of checking a loaded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatus {
    pub accessible: bool,
    pub status_code: u16,
    pub page_title: String,
    pub error: Option<String>,
}

/// Assess a page from its body text (`None` when there is no body) and title.
pub fn assess_page(body_text: Option<&str>, title: &str) -> PageStatus {
    let text = body_text.unwrap_or("");
    let is_error = ERROR_MARKERS.iter().any(|marker| text.contains(marker));

    let status_code = if !is_error {
        200
    } else if text.contains("404") {
        404
    } else if text.contains("403") {
        403
    } else if text.contains("500") {
        500
    } else {
        200
    };

    PageStatus {
        accessible: !is_error && body_text.is_some(),
        status_code,
        page_title: if title.is_empty() {
            "Untitled".to_string()
        } else {
            title.to_string()
        },
        error: is_error.then(|| "Page error detected".to_string()),
    }
}
