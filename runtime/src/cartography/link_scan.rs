//! Collect the unique internal content links of one page.

use crate::cartography::link_dedup::dedup_links;
use crate::cartography::url_classifier::{LinkRecord, PageLocation, UrlClassifier};
use crate::extraction::dom::{AnchorElement, HtmlSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Title used when a page has neither `<title>` nor `<h1>`.
const UNTITLED_PAGE: &str = "Untitled Page";

/// Links found on a page, with the page's title and URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkScan {
    pub links: Vec<LinkRecord>,
    pub page_title: String,
    pub current_url: String,
}

/// Classify every anchor and keep one record per distinct link.
pub fn collect_links(
    classifier: &UrlClassifier,
    anchors: &[AnchorElement],
    location: &PageLocation,
) -> Vec<LinkRecord> {
    let classified = anchors.iter().filter_map(|anchor| {
        match classifier.classify(&anchor.href, &anchor.text, location) {
            Ok(record) => Some(record),
            Err(reason) => {
                trace!(href = %anchor.href, %reason, "skipping link");
                None
            }
        }
    });
    let links = dedup_links(classified);
    debug!(
        "kept {} of {} links on {}",
        links.len(),
        anchors.len(),
        location.url()
    );
    links
}

/// Pick a page title: `<title>`, else the first heading, else a placeholder.
pub fn page_title(title: Option<String>, first_heading: Option<String>) -> String {
    title
        .filter(|t| !t.is_empty())
        .or(first_heading.filter(|h| !h.is_empty()))
        .unwrap_or_else(|| UNTITLED_PAGE.to_string())
}

/// Scan a static HTML document saved from `current_url`.
pub fn scan_html(
    classifier: &UrlClassifier,
    html: &str,
    current_url: &str,
) -> Result<LinkScan, url::ParseError> {
    let location = PageLocation::parse(current_url)?;
    let snapshot = HtmlSnapshot::parse(html);
    let links = collect_links(classifier, &snapshot.anchors(), &location);
    Ok(LinkScan {
        links,
        page_title: page_title(snapshot.title(), snapshot.first_heading()),
        current_url: location.url().to_string(),
    })
}
