//! The page-control seam between the inspectors and a live browser page.
//!
//! Implementations wrap whatever drives the browser. The inspectors only
//! query, read, click and wait; they never navigate.

use crate::extraction::dom::{AnchorElement, ImageElement};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque handle to an element on the page, valid for one page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub u64);

/// Exclusive control over one live page for the duration of a call.
#[async_trait]
pub trait PageControl: Send + Sync {
    /// Elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>>;

    /// Descendants of `scope` matching a CSS selector, in document order.
    async fn query_within(&self, scope: ElementRef, selector: &str) -> Result<Vec<ElementRef>>;

    /// The element with the given `id`.
    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>>;

    /// Text content of an element.
    async fn text_content(&self, element: ElementRef) -> Result<String>;

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>>;

    /// Whether the element's `disabled` property is set.
    async fn is_disabled(&self, element: ElementRef) -> Result<bool>;

    /// Whether any ancestor of the element matches the selector.
    async fn has_ancestor(&self, element: ElementRef, selector: &str) -> Result<bool>;

    /// Text of a clone of `panel` with everything matching
    /// `strip_selectors` removed. The live page is not modified.
    async fn panel_text(&self, panel: ElementRef, strip_selectors: &[String]) -> Result<String>;

    /// Click-equivalent activation of an element.
    async fn click(&mut self, element: ElementRef) -> Result<()>;

    /// Suspend for at least `duration` so the page can react.
    async fn settle(&mut self, duration: Duration);

    /// The page's current URL.
    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Text of the first `h1`, if any.
    async fn first_heading(&self) -> Result<Option<String>>;

    /// Body text, or `None` when the document has no body.
    async fn body_text(&self) -> Result<Option<String>>;

    /// All `a[href]` elements with their raw href and trimmed text.
    async fn anchors(&self) -> Result<Vec<AnchorElement>>;

    /// All `img` elements with rendered boxes and ancestor context.
    async fn images(&self) -> Result<Vec<ImageElement>>;

    /// Forget every handle handed out so far. Earlier [`ElementRef`]s
    /// must not be used afterwards.
    async fn release_handles(&mut self) -> Result<()> {
        Ok(())
    }

    /// First element matching a selector.
    async fn query_first(&self, selector: &str) -> Result<Option<ElementRef>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }
}
