//! [`PageControl`] over a Chrome DevTools page.
//!
//! Elements are kept in an in-page registry (`window.__siteprobeRefs`,
//! with a `Map` back to the index); an [`ElementRef`] is an index into it.
//! The registry is emptied by [`PageControl::release_handles`], which the
//! revealer calls at the start of every run. Every call is a single
//! `Runtime.evaluate` whose result is wrapped as `{ v: ... }` so that
//! `null` and `undefined` survive the round trip.

use crate::extraction::dom::{AnchorElement, ImageElement};
use crate::live::page::{ElementRef, PageControl};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Registers `el` and yields its index.
const REGISTER_FN: &str = r#"
    const __refs = (window.__siteprobeRefs = window.__siteprobeRefs || []);
    const __index = (window.__siteprobeIndex = window.__siteprobeIndex || new Map());
    const __register = (el) => {
        let i = __index.get(el);
        if (i === undefined) { i = __refs.push(el) - 1; __index.set(el, i); }
        return i;
    };
"#;

const RELEASE_SCRIPT: &str = r#"
    (() => {
        window.__siteprobeRefs = [];
        window.__siteprobeIndex = new Map();
        return { v: true };
    })()
"#;

const IMAGES_SCRIPT: &str = r#"
    (() => {
        const all = Array.from(document.querySelectorAll('*'));
        const images = Array.from(document.querySelectorAll('img')).map(img => {
            const rect = img.getBoundingClientRect();
            const ancestors = [];
            for (let el = img.parentElement; el; el = el.parentElement) {
                ancestors.push({
                    tag: el.tagName.toLowerCase(),
                    classes: Array.from(el.classList),
                    textPrefix: (el.textContent || '').substring(0, 200),
                });
            }
            return {
                src: img.src || null,
                dataSrc: img.getAttribute('data-src'),
                alt: img.alt || '',
                title: img.title || '',
                className: img.getAttribute('class') || '',
                id: img.id || '',
                rect: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
                ancestors,
                domIndex: all.indexOf(img),
            };
        });
        return { v: images };
    })()
"#;

const ANCHORS_SCRIPT: &str = r#"
    (() => ({
        v: Array.from(document.querySelectorAll('a[href]')).map(a => ({
            href: (a.getAttribute('href') || '').trim(),
            text: (a.textContent || '').trim(),
        })),
    }))()
"#;

#[derive(Deserialize)]
struct Wrapped<T> {
    v: T,
}

/// A live Chrome page driven through chromiumoxide.
#[derive(Debug, Clone)]
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("evaluating page script")?;
        let wrapped: Wrapped<T> = result
            .into_value()
            .context("decoding page script result")?;
        Ok(wrapped.v)
    }

    /// Evaluate `body` with `el` bound to the registered element.
    async fn eval_on<T: DeserializeOwned>(&self, element: ElementRef, body: &str) -> Result<T> {
        self.eval(format!(
            "(() => {{ {REGISTER_FN} const el = __refs[{}]; return {{ v: {body} }}; }})()",
            element.0
        ))
        .await
    }
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[async_trait]
impl PageControl for ChromiumPage {
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>> {
        let ids: Vec<u64> = self
            .eval(format!(
                "(() => {{ {REGISTER_FN} return {{ v: Array.from(document.querySelectorAll({})).map(__register) }}; }})()",
                js_str(selector)
            ))
            .await?;
        Ok(ids.into_iter().map(ElementRef).collect())
    }

    async fn query_within(&self, scope: ElementRef, selector: &str) -> Result<Vec<ElementRef>> {
        let ids: Vec<u64> = self
            .eval_on(
                scope,
                &format!(
                    "el ? Array.from(el.querySelectorAll({})).map(__register) : []",
                    js_str(selector)
                ),
            )
            .await?;
        Ok(ids.into_iter().map(ElementRef).collect())
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>> {
        let found: Option<u64> = self
            .eval(format!(
                "(() => {{ {REGISTER_FN} const el = document.getElementById({}); return {{ v: el ? __register(el) : null }}; }})()",
                js_str(id)
            ))
            .await?;
        Ok(found.map(ElementRef))
    }

    async fn text_content(&self, element: ElementRef) -> Result<String> {
        self.eval_on(element, "el ? (el.textContent || '') : ''").await
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        self.eval_on(
            element,
            &format!("el ? el.getAttribute({}) : null", js_str(name)),
        )
        .await
    }

    async fn is_disabled(&self, element: ElementRef) -> Result<bool> {
        self.eval_on(element, "!!(el && el.disabled)").await
    }

    async fn has_ancestor(&self, element: ElementRef, selector: &str) -> Result<bool> {
        self.eval_on(
            element,
            &format!(
                "!!(el && el.parentElement && el.parentElement.closest({}))",
                js_str(selector)
            ),
        )
        .await
    }

    async fn panel_text(&self, panel: ElementRef, strip_selectors: &[String]) -> Result<String> {
        let strip = js_str(&strip_selectors.join(", "));
        self.eval_on(
            panel,
            &format!(
                "(() => {{ if (!el) return ''; const c = el.cloneNode(true); \
                 if ({strip}) c.querySelectorAll({strip}).forEach(n => n.remove()); \
                 return (c.textContent || '').trim(); }})()"
            ),
        )
        .await
    }

    async fn click(&mut self, element: ElementRef) -> Result<()> {
        let clicked: bool = self
            .eval_on(element, "(() => { if (!el || !el.isConnected) return false; el.click(); return true; })()")
            .await?;
        if !clicked {
            bail!("element {} is no longer attached", element.0);
        }
        Ok(())
    }

    async fn settle(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn release_handles(&mut self) -> Result<()> {
        let _: bool = self.eval(RELEASE_SCRIPT.to_string()).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.eval("({ v: location.href })".to_string()).await
    }

    async fn title(&self) -> Result<String> {
        self.eval("({ v: document.title || '' })".to_string()).await
    }

    async fn first_heading(&self) -> Result<Option<String>> {
        self.eval(
            "(() => { const h = document.querySelector('h1'); const t = h ? h.textContent.trim() : ''; return { v: t || null }; })()"
                .to_string(),
        )
        .await
    }

    async fn body_text(&self) -> Result<Option<String>> {
        self.eval("({ v: document.body ? document.body.textContent : null })".to_string())
            .await
    }

    async fn anchors(&self) -> Result<Vec<AnchorElement>> {
        self.eval(ANCHORS_SCRIPT.to_string()).await
    }

    async fn images(&self) -> Result<Vec<ImageElement>> {
        self.eval(IMAGES_SCRIPT.to_string()).await
    }
}
