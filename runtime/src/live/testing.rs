//! Scripted in-memory page for exercising the live inspectors.

use crate::extraction::dom::{AnchorElement, ImageElement};
use crate::live::page::{ElementRef, PageControl};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Something the inspector did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click(ElementRef),
    Settle(Duration),
    /// Panel text or disabled state was read.
    Read(ElementRef),
}

/// One element of the fake document.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    id: Option<String>,
    text: String,
    /// Child fragments as (selector, text), dropped when stripped.
    children: Vec<(String, String)>,
    attrs: HashMap<String, String>,
    /// Selectors this node answers to.
    selectors: Vec<String>,
    /// Selectors matched by some ancestor of this node.
    ancestor_selectors: Vec<String>,
    /// Scopes (elements) this node is nested in.
    scopes: Vec<ElementRef>,
    disabled: bool,
    fails_click: bool,
    /// Disable the node (and set `aria-disabled`) after this many clicks.
    disable_after: Option<usize>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self.attrs.insert("id".to_string(), id.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, selector: &str, text: &str) -> Self {
        self.children.push((selector.to_string(), text.to_string()));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn matching(mut self, selectors: &[&str]) -> Self {
        self.selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn inside_chrome(mut self, selector: &str) -> Self {
        self.ancestor_selectors.push(selector.to_string());
        self
    }

    pub fn within(mut self, scope: ElementRef) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.fails_click = true;
        self
    }

    pub fn disable_after(mut self, clicks: usize) -> Self {
        self.disable_after = Some(clicks);
        self
    }
}

/// A page that answers queries from a node list and records interactions.
#[derive(Debug, Default)]
pub struct FakePage {
    url: String,
    title: String,
    heading: Option<String>,
    body: Option<String>,
    nodes: Vec<FakeNode>,
    clicks: HashMap<ElementRef, usize>,
    anchors: Vec<AnchorElement>,
    images: Vec<ImageElement>,
    real_sleep: bool,
    releases: usize,
    events: Mutex<Vec<PageEvent>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            body: Some(String::new()),
            ..Default::default()
        }
    }

    pub fn add(&mut self, node: FakeNode) -> ElementRef {
        self.nodes.push(node);
        ElementRef(self.nodes.len() as u64 - 1)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_heading(mut self, heading: &str) -> Self {
        self.heading = Some(heading.to_string());
        self
    }

    pub fn with_body(mut self, body: Option<&str>) -> Self {
        self.body = body.map(String::from);
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<AnchorElement>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageElement>) -> Self {
        self.images = images;
        self
    }

    /// Make `settle` really sleep, for timeout tests.
    pub fn sleeping(mut self) -> Self {
        self.real_sleep = true;
        self
    }

    /// How many times handles were released.
    pub fn releases(&self) -> usize {
        self.releases
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clicks(&self) -> Vec<ElementRef> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::Click(el) => Some(el),
                _ => None,
            })
            .collect()
    }

    pub fn settles(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::Settle(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: PageEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn node(&self, element: ElementRef) -> Result<&FakeNode> {
        self.nodes
            .get(element.0 as usize)
            .ok_or_else(|| anyhow!("stale element {:?}", element))
    }

    fn matching(&self, selector: &str) -> Vec<ElementRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.selectors.iter().any(|s| s == selector))
            .map(|(i, _)| ElementRef(i as u64))
            .collect()
    }

    fn is_disabled_now(&self, element: ElementRef) -> bool {
        let Ok(node) = self.node(element) else {
            return false;
        };
        let clicks = self.clicks.get(&element).copied().unwrap_or(0);
        node.disabled || node.disable_after.is_some_and(|limit| clicks >= limit)
    }
}

#[async_trait]
impl PageControl for FakePage {
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>> {
        Ok(self.matching(selector))
    }

    async fn query_within(&self, scope: ElementRef, selector: &str) -> Result<Vec<ElementRef>> {
        Ok(self
            .matching(selector)
            .into_iter()
            .filter(|el| {
                self.node(*el)
                    .map(|n| n.scopes.contains(&scope))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>> {
        Ok(self
            .nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id))
            .map(|i| ElementRef(i as u64)))
    }

    async fn text_content(&self, element: ElementRef) -> Result<String> {
        Ok(self.node(element)?.text.clone())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        if name == "aria-disabled" && self.is_disabled_now(element) {
            return Ok(Some("true".to_string()));
        }
        Ok(self.node(element)?.attrs.get(name).cloned())
    }

    async fn is_disabled(&self, element: ElementRef) -> Result<bool> {
        self.record(PageEvent::Read(element));
        Ok(self.is_disabled_now(element))
    }

    async fn has_ancestor(&self, element: ElementRef, selector: &str) -> Result<bool> {
        let node = self.node(element)?;
        Ok(selector
            .split(',')
            .map(str::trim)
            .any(|part| node.ancestor_selectors.iter().any(|s| s == part)))
    }

    async fn panel_text(&self, panel: ElementRef, strip_selectors: &[String]) -> Result<String> {
        let node = self.node(panel)?;
        self.record(PageEvent::Read(panel));
        let mut text = node.text.clone();
        for (selector, child) in &node.children {
            if !strip_selectors.iter().any(|s| s == selector) {
                text.push_str(child);
            }
        }
        Ok(text)
    }

    async fn click(&mut self, element: ElementRef) -> Result<()> {
        if self.node(element)?.fails_click {
            return Err(anyhow!("element {:?} is not clickable", element));
        }
        self.record(PageEvent::Click(element));
        *self.clicks.entry(element).or_default() += 1;
        Ok(())
    }

    async fn settle(&mut self, duration: Duration) {
        self.record(PageEvent::Settle(duration));
        if self.real_sleep {
            tokio::time::sleep(duration).await;
        }
    }

    async fn release_handles(&mut self) -> Result<()> {
        self.releases += 1;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.title.clone())
    }

    async fn first_heading(&self) -> Result<Option<String>> {
        Ok(self.heading.clone())
    }

    async fn body_text(&self) -> Result<Option<String>> {
        Ok(self.body.clone())
    }

    async fn anchors(&self) -> Result<Vec<AnchorElement>> {
        Ok(self.anchors.clone())
    }

    async fn images(&self) -> Result<Vec<ImageElement>> {
        Ok(self.images.clone())
    }
}
