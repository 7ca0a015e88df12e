//! Siteprobe runtime: page inspection primitives for documentation-site crawlers.
//!
//! Given a live page behind [`live::page::PageControl`], the runtime can
//! classify and deduplicate its links, pick out its content images, check
//! whether it is an error page, and reveal content hidden behind tabs,
//! accordions and carousels. The sitemap document written between crawl
//! phases is parsed and rendered by [`cartography::sitemap_doc`].

pub mod cartography;
pub mod config;
pub mod extraction;
pub mod live;
pub mod logging;

pub use cartography::link_dedup::{dedup_key, dedup_links};
pub use cartography::link_scan::LinkScan;
pub use cartography::page_status::PageStatus;
pub use cartography::sitemap_doc::{parse_sitemap_document, SitemapEntry};
pub use cartography::url_classifier::{LinkRecord, LinkRejection, PageLocation, UrlClassifier};
pub use config::{ConfigError, InspectConfig, PatternTables, RevealConfig};
pub use extraction::images::{ImageCandidate, ImageSelector};
pub use live::page::{ElementRef, PageControl};
pub use live::reveal::{reveal_within, RevealError, RevealReport, Revealer, TabContentMap};
