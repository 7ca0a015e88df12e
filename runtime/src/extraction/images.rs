//! Pick the images of a page that carry content.
//!
//! An image is dropped only when it looks decorative: tiny, named like an
//! icon/logo, placed in page chrome, or a small vector graphic. Everything
//! else is kept and returned in reading order.

use crate::config::PatternTables;
use crate::extraction::dom::{AncestorNode, ImageElement};
use crate::extraction::text::slugify_context;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

/// Boxes smaller than this in both dimensions are decorative.
const MIN_CONTENT_SIDE: f64 = 50.0;
/// Vector images smaller than this in both dimensions are decorative.
const MIN_VECTOR_SIDE: f64 = 100.0;
/// Size above which an image is likely content.
const LIKELY_CONTENT_SIDE: f64 = 100.0;
/// Alt text longer than this suggests a content image.
const LIKELY_CONTENT_ALT_CHARS: usize = 20;

/// A selected content image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub x: i64,
    pub y: i64,
    pub can_download_same_origin: bool,
    pub position_index: usize,
    pub context_slug: String,
}

/// Filters image elements using the image tables of a [`PatternTables`].
#[derive(Debug, Clone)]
pub struct ImageSelector {
    tables: PatternTables,
    keywords: Vec<String>,
}

impl Default for ImageSelector {
    fn default() -> Self {
        Self::new(PatternTables::default())
    }
}

impl ImageSelector {
    pub fn new(tables: PatternTables) -> Self {
        let keywords = tables
            .decorative_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        Self { tables, keywords }
    }

    /// Select content images from `images`, found on the page at `page_url`,
    /// sorted by `y` then `x`.
    pub fn select(&self, images: &[ImageElement], page_url: &Url) -> Vec<ImageCandidate> {
        let mut selected: Vec<ImageCandidate> = Vec::new();

        for image in images {
            let src = image_source(image);
            if self.is_decorative(image, &src) {
                trace!(src = %src, "skipping decorative image");
                continue;
            }

            // Admission is "not decorative"; the content hint is informational.
            trace!(
                src = %src,
                likely_content = self.is_likely_content(image),
                "admitting image"
            );

            let slug = self
                .context_block(&image.ancestors)
                .map(|block| slugify_context(&block.text_prefix))
                .unwrap_or_default();
            let context_slug = if slug.is_empty() {
                format!("image-{}", selected.len() + 1)
            } else {
                slug
            };

            selected.push(ImageCandidate {
                can_download_same_origin: can_download_same_origin(&src, page_url),
                src,
                alt: image.alt.clone(),
                title: image.title.clone(),
                width: image.rect.width,
                height: image.rect.height,
                x: image.rect.x.round() as i64,
                y: image.rect.y.round() as i64,
                position_index: image.dom_index,
                context_slug,
            });
        }

        selected.sort_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)));
        debug!("selected {} of {} images", selected.len(), images.len());
        selected
    }

    /// Whether an image is decoration rather than content.
    pub fn is_decorative(&self, image: &ImageElement, src: &str) -> bool {
        let rect = image.rect;
        (rect.width < MIN_CONTENT_SIDE && rect.height < MIN_CONTENT_SIDE)
            || self.has_decorative_keyword(&image.alt)
            || self.has_decorative_keyword(&image.class_name)
            || self.has_decorative_keyword(&image.id)
            || image.ancestors.iter().any(|a| self.is_chrome(a))
            || (src.contains(".svg")
                && rect.width < MIN_VECTOR_SIDE
                && rect.height < MIN_VECTOR_SIDE)
    }

    /// Size, alt text or placement suggest content.
    pub fn is_likely_content(&self, image: &ImageElement) -> bool {
        image.rect.width > LIKELY_CONTENT_SIDE
            || image.rect.height > LIKELY_CONTENT_SIDE
            || image.alt.chars().count() > LIKELY_CONTENT_ALT_CHARS
            || image.ancestors.iter().any(|a| {
                matches_any(
                    a,
                    &self.tables.content_ancestor_tags,
                    &self.tables.content_ancestor_classes,
                )
            })
    }

    fn has_decorative_keyword(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    fn is_chrome(&self, ancestor: &AncestorNode) -> bool {
        matches_any(
            ancestor,
            &self.tables.chrome_ancestor_tags,
            &self.tables.chrome_ancestor_classes,
        )
    }

    fn context_block<'a>(&self, ancestors: &'a [AncestorNode]) -> Option<&'a AncestorNode> {
        ancestors.iter().find(|a| {
            self.tables
                .block_context_tags
                .iter()
                .any(|tag| a.tag.eq_ignore_ascii_case(tag))
        })
    }
}

fn matches_any(ancestor: &AncestorNode, tags: &[String], classes: &[String]) -> bool {
    tags.iter().any(|t| ancestor.tag.eq_ignore_ascii_case(t))
        || classes.iter().any(|c| ancestor.has_class(c))
}

/// `src`, falling back to `data-src` for lazy-loaded images.
fn image_source(image: &ImageElement) -> String {
    image
        .src
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(image.data_src.as_deref())
        .unwrap_or("")
        .to_string()
}

/// Inline data, blobs and same-origin URLs can be fetched by the page itself.
pub fn can_download_same_origin(src: &str, page_url: &Url) -> bool {
    if src.is_empty() {
        return false;
    }
    if src.starts_with("data:") || src.starts_with("blob:") {
        return true;
    }
    page_url
        .join(src)
        .map(|resolved| resolved.origin() == page_url.origin())
        .unwrap_or(false)
}
