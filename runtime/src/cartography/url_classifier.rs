//! Normalize hrefs against the current page and classify them as
//! internal content links, file downloads, or rejects.

use crate::config::PatternTables;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Href prefixes that never lead to content: in-page anchors and actions.
const EXCLUDED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:"];

/// The page an href was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(current_url: &str) -> Result<Self, url::ParseError> {
        Url::parse(current_url).map(Self::from_url)
    }

    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    /// The current absolute URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// `scheme://hostname`, without port, prepended to root-relative hrefs.
    pub fn origin_prefix(&self) -> String {
        format!("{}://{}", self.url.scheme(), self.hostname())
    }
}

/// A classified in-site link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Absolute URL without fragment.
    pub href: String,
    /// Anchor text, or the original href when the anchor has none.
    pub text: String,
    pub is_internal: bool,
    pub is_file_download: bool,
    /// Extension as written in the href, for file downloads.
    pub file_type: Option<String>,
    /// The href exactly as found on the page.
    pub original_href: String,
}

/// Why an href produced no [`LinkRecord`].
#[derive(Debug, Error)]
pub enum LinkRejection {
    #[error("empty href")]
    Empty,
    #[error("malformed href {href:?}: {source}")]
    Malformed {
        href: String,
        #[source]
        source: url::ParseError,
    },
    #[error("external link to {host:?}")]
    External { host: String },
    #[error("not a content link: {href:?}")]
    NotContent { href: String },
}

/// Classifies hrefs using the link tables of a [`PatternTables`].
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    file_extensions: Vec<String>,
    content_suffixes: Vec<String>,
    content_path_markers: Vec<String>,
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(&PatternTables::default())
    }
}

impl UrlClassifier {
    pub fn new(tables: &PatternTables) -> Self {
        Self {
            file_extensions: tables
                .file_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            content_suffixes: tables.content_suffixes.clone(),
            content_path_markers: tables.content_path_markers.clone(),
        }
    }

    /// Classify one href found on `location` with anchor text `text`.
    pub fn classify(
        &self,
        href: &str,
        text: &str,
        location: &PageLocation,
    ) -> Result<LinkRecord, LinkRejection> {
        if href.is_empty() {
            return Err(LinkRejection::Empty);
        }

        let mut normalized =
            normalize_href(href, location).map_err(|source| LinkRejection::Malformed {
                href: href.to_string(),
                source,
            })?;

        let host = normalized.host_str().unwrap_or("");
        if !is_internal(host, href, location.hostname()) {
            return Err(LinkRejection::External {
                host: host.to_string(),
            });
        }

        let file_type = self.file_extension(href);
        if !self.is_content_link(href, file_type.is_some()) {
            return Err(LinkRejection::NotContent {
                href: href.to_string(),
            });
        }

        normalized.set_fragment(None);
        let text = if text.is_empty() { href } else { text };

        Ok(LinkRecord {
            href: normalized.to_string(),
            text: text.to_string(),
            is_internal: true,
            is_file_download: file_type.is_some(),
            file_type,
            original_href: href.to_string(),
        })
    }

    /// The trailing extension of `href` when it names a downloadable file.
    pub fn file_extension(&self, href: &str) -> Option<String> {
        let (_, ext) = href.rsplit_once('.')?;
        let lower = ext.to_ascii_lowercase();
        self.file_extensions
            .iter()
            .any(|known| *known == lower)
            .then(|| ext.to_string())
    }

    fn is_content_link(&self, href: &str, is_file_download: bool) -> bool {
        if EXCLUDED_PREFIXES.iter().any(|p| href.starts_with(p)) {
            return false;
        }
        self.content_suffixes.iter().any(|s| href.ends_with(s.as_str()))
            || self
                .content_path_markers
                .iter()
                .any(|m| href.contains(m.as_str()))
            || is_file_download
            || !href.contains('#')
    }
}

/// Resolve `href` into an absolute URL.
///
/// Any href with a leading `/` gets the page's `scheme://hostname`
/// prepended as-is; dot-relative hrefs resolve against the current URL;
/// everything else must already be absolute.
pub fn normalize_href(href: &str, location: &PageLocation) -> Result<Url, url::ParseError> {
    if href.starts_with('/') {
        Url::parse(&format!("{}{href}", location.origin_prefix()))
    } else if href.starts_with("./") || href.starts_with("../") {
        location.url().join(href)
    } else {
        Url::parse(href)
    }
}

fn is_internal(host: &str, href: &str, current_host: &str) -> bool {
    host == current_host
        || host
            .strip_suffix(current_host)
            .is_some_and(|rest| rest.ends_with('.'))
        || (href.starts_with('/') && !href.starts_with("//"))
}
