//! Reveal content hidden behind tabs, accordions and carousels.
//!
//! A run walks a fixed sequence of phases against one page:
//!
//! ```text
//! Idle -> ScanningTabs -> (Activating -> WaitingStable -> ExtractingPanel)*
//!      -> ExpandingAccordions -> PagingCarousel -> Done
//! ```
//!
//! Every interaction is followed by a settle interval before the page is
//! read again. Failures on single elements are logged and skipped.

use crate::config::{ConfigError, RevealConfig};
use crate::extraction::text::{prefix_chars, TextCleaner};
use crate::live::page::{ElementRef, PageControl};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where a reveal run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    ScanningTabs,
    Activating,
    WaitingStable,
    ExtractingPanel,
    ExpandingAccordions,
    PagingCarousel,
    Done,
}

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("reveal did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Tab label → panel text, in the order tabs were activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabContentMap {
    entries: Vec<(String, String)>,
}

impl TabContentMap {
    /// Insert or replace; a replaced label keeps its original position.
    pub fn insert(&mut self, label: String, content: String) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((label, content)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }

    /// Whether a recorded value starts with the same `n` chars as `content`.
    pub fn has_prefix_of(&self, content: &str, n: usize) -> bool {
        let prefix = prefix_chars(content, n);
        self.entries
            .iter()
            .any(|(_, existing)| prefix_chars(existing, n) == prefix)
    }
}

impl Serialize for TabContentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, content) in &self.entries {
            map.serialize_entry(label, content)?;
        }
        map.end()
    }
}

/// What a reveal run exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealReport {
    pub tab_content: TabContentMap,
    pub tabs_found: usize,
    pub tabs_extracted: usize,
    pub accordions_expanded: usize,
    pub carousel_advances: usize,
}

/// Drives reveal runs with one configuration.
#[derive(Debug, Clone)]
pub struct Revealer {
    config: RevealConfig,
    cleaner: TextCleaner,
}

impl Revealer {
    pub fn new(config: RevealConfig) -> Result<Self, ConfigError> {
        let cleaner = TextCleaner::new(config.compile_boilerplate()?);
        Ok(Self { config, cleaner })
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Expand everything on `page` and collect tab panel text.
    ///
    /// Not idempotent: the page keeps whatever state the clicks left it in.
    pub async fn reveal(&self, page: &mut dyn PageControl) -> RevealReport {
        if let Err(e) = page.release_handles().await {
            warn!("failed to release element handles: {e}");
        }
        let mut run = RevealRun {
            revealer: self,
            page,
            phase: RevealPhase::Idle,
            report: RevealReport::default(),
        };
        run.scan_tabs().await;
        run.expand_accordions().await;
        run.page_carousel().await;

        run.page.settle(self.config.final_settle()).await;
        run.enter(RevealPhase::Done);

        let mut report = run.report;
        report.tabs_extracted = report.tab_content.len();
        info!(
            tabs_found = report.tabs_found,
            tabs_extracted = report.tabs_extracted,
            accordions = report.accordions_expanded,
            carousel = report.carousel_advances,
            "dynamic content revealed"
        );
        report
    }
}

/// Run `revealer` against `page`, giving up after `limit`.
///
/// On timeout no further interactions are issued and partial output is
/// dropped.
pub async fn reveal_within(
    revealer: &Revealer,
    page: &mut dyn PageControl,
    limit: Duration,
) -> Result<RevealReport, RevealError> {
    tokio::time::timeout(limit, revealer.reveal(page))
        .await
        .map_err(|_| {
            warn!("reveal timed out after {limit:?}");
            RevealError::TimedOut(limit)
        })
}

struct RevealRun<'r, 'p> {
    revealer: &'r Revealer,
    page: &'p mut dyn PageControl,
    phase: RevealPhase,
    report: RevealReport,
}

impl RevealRun<'_, '_> {
    fn enter(&mut self, phase: RevealPhase) {
        debug!(from = ?self.phase, to = ?phase, "reveal phase");
        self.phase = phase;
    }

    fn config(&self) -> &RevealConfig {
        &self.revealer.config
    }

    async fn scan_tabs(&mut self) {
        self.enter(RevealPhase::ScanningTabs);
        let tabs = self.discover_tabs().await;
        self.report.tabs_found = tabs.len();

        for (index, tab) in tabs.into_iter().enumerate() {
            let label = self.tab_label(tab, index).await;

            self.enter(RevealPhase::Activating);
            if let Err(e) = self.page.click(tab).await {
                warn!("failed to activate tab {label:?}: {e}");
                continue;
            }

            self.enter(RevealPhase::WaitingStable);
            let settle = self.config().tab_settle();
            self.page.settle(settle).await;

            self.enter(RevealPhase::ExtractingPanel);
            let Some(panel) = self.find_panel(tab).await else {
                debug!("no panel found for tab {label:?}");
                continue;
            };
            let raw = match self
                .page
                .panel_text(panel, &self.revealer.config.panel_strip_selectors)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("failed to read panel for tab {label:?}: {e}");
                    continue;
                }
            };

            let content = self.revealer.cleaner.clean(&raw);
            if self.should_keep(&content) {
                self.report.tab_content.insert(label, content);
            } else {
                debug!("dropping panel text for tab {label:?} ({} chars)", content.chars().count());
            }
        }
    }

    /// The matches of the first tab selector that matches anything.
    async fn discover_tabs(&self) -> Vec<ElementRef> {
        for selector in &self.config().tab_selectors {
            match self.page.query_all(selector).await {
                Ok(found) if !found.is_empty() => {
                    debug!("found {} tabs with {selector}", found.len());
                    return found;
                }
                Ok(_) => {}
                Err(e) => warn!("tab query {selector} failed: {e}"),
            }
        }
        Vec::new()
    }

    async fn tab_label(&self, tab: ElementRef, index: usize) -> String {
        let text = self.page.text_content(tab).await.unwrap_or_default();
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
        match self.page.attribute(tab, "aria-label").await {
            Ok(Some(label)) if !label.is_empty() => label,
            _ => format!("Tab {}", index + 1),
        }
    }

    /// Panel named by `aria-controls`, else one labelled by the tab, else
    /// the element carrying the tab's `id`.
    async fn find_panel(&self, tab: ElementRef) -> Option<ElementRef> {
        if let Ok(Some(controls)) = self.page.attribute(tab, "aria-controls").await {
            if let Some(id) = controls.split_whitespace().next() {
                if let Ok(Some(panel)) = self.page.element_by_id(id).await {
                    return Some(panel);
                }
            }
        }

        let id = self.page.attribute(tab, "id").await.ok().flatten()?;
        if id.is_empty() {
            return None;
        }
        if !id.contains(['"', '\\']) {
            let selector = format!(r#"[aria-labelledby~="{id}"]"#);
            if let Ok(Some(panel)) = self.page.query_first(&selector).await {
                return Some(panel);
            }
        }
        self.page.element_by_id(&id).await.ok().flatten()
    }

    /// Long enough and not a near-duplicate of an earlier panel.
    fn should_keep(&self, content: &str) -> bool {
        let config = self.config();
        content.chars().count() > config.min_tab_chars
            && !self
                .report
                .tab_content
                .has_prefix_of(content, config.duplicate_prefix_chars)
    }

    async fn expand_accordions(&mut self) {
        self.enter(RevealPhase::ExpandingAccordions);
        let config = self.revealer.config.clone();

        let mut main = None;
        for selector in &config.main_region_selectors {
            if let Ok(Some(region)) = self.page.query_first(selector).await {
                main = Some(region);
                break;
            }
        }

        let toggles = match main {
            Some(region) => self.page.query_within(region, &config.accordion_selector).await,
            None => self.page.query_all(&config.accordion_selector).await,
        };
        let toggles = match toggles {
            Ok(toggles) => toggles,
            Err(e) => {
                warn!("accordion query failed: {e}");
                return;
            }
        };

        for toggle in toggles {
            match self
                .page
                .has_ancestor(toggle, &config.accordion_chrome_selector)
                .await
            {
                Ok(false) => {}
                Ok(true) => continue,
                Err(e) => {
                    warn!("skipping accordion toggle: {e}");
                    continue;
                }
            }
            if let Err(e) = self.page.click(toggle).await {
                debug!("accordion toggle not clickable: {e}");
                continue;
            }
            self.page.settle(config.accordion_settle()).await;
            self.report.accordions_expanded += 1;
        }
    }

    async fn page_carousel(&mut self) {
        self.enter(RevealPhase::PagingCarousel);
        let config = self.revealer.config.clone();

        let next = match self.page.query_first(&config.carousel_next_selector).await {
            Ok(Some(next)) => next,
            Ok(None) => return,
            Err(e) => {
                warn!("carousel query failed: {e}");
                return;
            }
        };

        while self.report.carousel_advances < config.carousel_max_advances {
            if let Err(e) = self.page.click(next).await {
                warn!("carousel next not clickable: {e}");
                break;
            }
            self.page.settle(config.carousel_settle()).await;
            self.report.carousel_advances += 1;

            if !self.carousel_has_next(next).await {
                break;
            }
        }
        if self.report.carousel_advances == config.carousel_max_advances {
            debug!("carousel stopped at the {} click cap", config.carousel_max_advances);
        }
    }

    async fn carousel_has_next(&self, next: ElementRef) -> bool {
        let disabled = self.page.is_disabled(next).await.unwrap_or(true);
        let aria_disabled = self
            .page
            .attribute(next, "aria-disabled")
            .await
            .map(|a| a.is_some())
            .unwrap_or(true);
        !disabled && !aria_disabled
    }
}
