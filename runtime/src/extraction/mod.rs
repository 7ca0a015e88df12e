//! Extraction helpers over DOM snapshots.
//!
//! Plain data types for what a page reports about its anchors and images,
//! the content image selector, and text cleanup shared with the revealer.

pub mod dom;
pub mod images;
pub mod text;
