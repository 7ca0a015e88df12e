//! DOM snapshot values handed over by the page collaborator.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// A link element as read from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorElement {
    /// The raw `href` attribute.
    pub href: String,
    /// Trimmed text content.
    pub text: String,
}

/// Rendered bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One ancestor of an element, nearest first in [`ImageElement::ancestors`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AncestorNode {
    /// Lowercase tag name.
    pub tag: String,
    pub classes: Vec<String>,
    /// Leading text of the element; collaborators may truncate it.
    pub text_prefix: String,
}

impl AncestorNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// An `<img>` element with its rendered box and DOM context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageElement {
    pub src: Option<String>,
    pub data_src: Option<String>,
    pub alt: String,
    pub title: String,
    pub class_name: String,
    pub id: String,
    pub rect: Rect,
    pub ancestors: Vec<AncestorNode>,
    /// Index of the element among all elements of the document.
    pub dom_index: usize,
}

/// A parsed static HTML document.
///
/// Used for offline link scans of saved pages. `scraper::Html` is not
/// `Send`, so keep a snapshot on one thread.
pub struct HtmlSnapshot {
    document: Html,
}

impl HtmlSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// All `a[href]` elements in document order.
    pub fn anchors(&self) -> Vec<AnchorElement> {
        let Ok(sel) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        self.document
            .select(&sel)
            .filter_map(|el| {
                let href = el.value().attr("href")?;
                Some(AnchorElement {
                    href: href.trim().to_string(),
                    text: el.text().collect::<String>().trim().to_string(),
                })
            })
            .collect()
    }

    /// Trimmed `<title>` text, if non-empty.
    pub fn title(&self) -> Option<String> {
        self.first_text("title")
    }

    /// Trimmed text of the first `<h1>`, if non-empty.
    pub fn first_heading(&self) -> Option<String> {
        self.first_text("h1")
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        let sel = Selector::parse(selector).ok()?;
        let text = self
            .document
            .select(&sel)
            .next()?
            .text()
            .collect::<String>()
            .trim()
            .to_string();
        (!text.is_empty()).then_some(text)
    }
}
