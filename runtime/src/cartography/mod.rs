//! Cartography: link classification, deduplication, page status and the sitemap document.

pub mod link_dedup;
pub mod link_scan;
pub mod page_status;
pub mod sitemap_doc;
pub mod url_classifier;
