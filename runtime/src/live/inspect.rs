//! Read-only inspections of a live page: links, content images, status.

use crate::cartography::link_scan::{collect_links, page_title, LinkScan};
use crate::cartography::page_status::{assess_page, PageStatus};
use crate::cartography::url_classifier::{PageLocation, UrlClassifier};
use crate::extraction::images::{ImageCandidate, ImageSelector};
use crate::live::page::PageControl;
use anyhow::{Context, Result};
use tracing::debug;

/// Classify and deduplicate the links of the page.
pub async fn scan_page_links(
    page: &dyn PageControl,
    classifier: &UrlClassifier,
) -> Result<LinkScan> {
    let current_url = page.current_url().await?;
    let location =
        PageLocation::parse(&current_url).with_context(|| format!("parsing page URL {current_url}"))?;

    let anchors = page.anchors().await.context("reading anchors")?;
    let links = collect_links(classifier, &anchors, &location);

    let title = page.title().await.ok().filter(|t| !t.is_empty());
    let heading = page.first_heading().await.ok().flatten();

    Ok(LinkScan {
        links,
        page_title: page_title(title, heading),
        current_url,
    })
}

/// Select the content images of the page in reading order.
pub async fn select_page_images(
    page: &dyn PageControl,
    selector: &ImageSelector,
) -> Result<Vec<ImageCandidate>> {
    let current_url = page.current_url().await?;
    let location =
        PageLocation::parse(&current_url).with_context(|| format!("parsing page URL {current_url}"))?;
    let images = page.images().await.context("reading images")?;
    Ok(selector.select(&images, location.url()))
}

/// Check whether the loaded page is an error page.
pub async fn check_page_status(page: &dyn PageControl) -> Result<PageStatus> {
    let body = page.body_text().await?;
    let title = page.title().await.unwrap_or_default();
    let status = assess_page(body.as_deref(), &title);
    debug!(
        accessible = status.accessible,
        status = status.status_code,
        "checked page status"
    );
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::dom::{AnchorElement, ImageElement, Rect};
    use crate::live::testing::FakePage;

    fn anchor(href: &str, text: &str) -> AnchorElement {
        AnchorElement {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_scan_page_links() {
        let page = FakePage::new("https://help.example.com/content/start.html")
            .with_heading("Getting started")
            .with_anchors(vec![
                anchor("/content/a.html", "A"),
                anchor("/content/a.html#part-2", "A again"),
                anchor("https://other.test/", "Other"),
                anchor("tel:123", "Call"),
            ]);

        let scan = scan_page_links(&page, &UrlClassifier::default()).await.unwrap();
        assert_eq!(scan.page_title, "Getting started");
        assert_eq!(scan.current_url, "https://help.example.com/content/start.html");
        assert_eq!(scan.links.len(), 1);
        assert_eq!(scan.links[0].href, "https://help.example.com/content/a.html");
        assert_eq!(scan.links[0].text, "A");
    }

    #[tokio::test]
    async fn test_select_page_images() {
        let big = ImageElement {
            src: Some("/img/diagram.png".to_string()),
            rect: Rect {
                x: 0.0,
                y: 300.0,
                width: 640.0,
                height: 480.0,
            },
            ..Default::default()
        };
        let logo = ImageElement {
            src: Some("/img/logo.png".to_string()),
            alt: "Company logo".to_string(),
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 80.0,
            },
            ..Default::default()
        };
        let page = FakePage::new("https://help.example.com/").with_images(vec![logo, big]);
        let images = select_page_images(&page, &ImageSelector::default()).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src, "/img/diagram.png");
        assert!(images[0].can_download_same_origin);
    }

    #[tokio::test]
    async fn test_check_page_status() {
        let page = FakePage::new("https://help.example.com/")
            .with_title("Missing")
            .with_body(Some("404 - Not Found"));
        let status = check_page_status(&page).await.unwrap();
        assert!(!status.accessible);
        assert_eq!(status.status_code, 404);
        assert_eq!(status.page_title, "Missing");
    }

    #[tokio::test]
    async fn test_bad_page_url() {
        let page = FakePage::new("not a url");
        assert!(scan_page_links(&page, &UrlClassifier::default()).await.is_err());
    }
}
