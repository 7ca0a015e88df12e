//! Live page handlers: the page-control seam, hidden-content reveal and read-only inspections.

#[cfg(feature = "chromium")]
pub mod chromium;
pub mod inspect;
pub mod page;
pub mod reveal;

#[cfg(test)]
pub(crate) mod testing;
