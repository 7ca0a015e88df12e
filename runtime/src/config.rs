//! Pattern tables and interaction timings.
//!
//! Every keyword list, path marker and selector the inspectors use lives
//! here as data. Defaults for the pattern tables are embedded at compile
//! time; a JSON file can override any subset of fields.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Raw JSON content of the default pattern tables, embedded at compile time.
const DEFAULT_PATTERNS_JSON: &str = include_str!("default_patterns.json");

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "SITEPROBE_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid boilerplate pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Keyword and marker tables used by the link and image heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTables {
    /// Extensions (without the dot) that mark a link as a file download.
    pub file_extensions: Vec<String>,
    /// Href suffixes that mark a link as a content page.
    pub content_suffixes: Vec<String>,
    /// Path fragments that mark a link as a content page.
    pub content_path_markers: Vec<String>,
    /// Substrings of alt/class/id that mark an image as decorative.
    pub decorative_keywords: Vec<String>,
    /// Ancestor tags that make an image page chrome.
    pub chrome_ancestor_tags: Vec<String>,
    /// Ancestor classes that make an image page chrome.
    pub chrome_ancestor_classes: Vec<String>,
    /// Ancestor tags that hint an image is content.
    pub content_ancestor_tags: Vec<String>,
    /// Ancestor classes that hint an image is content.
    pub content_ancestor_classes: Vec<String>,
    /// Block-level tags whose text names an image's context.
    pub block_context_tags: Vec<String>,
}

impl Default for PatternTables {
    fn default() -> Self {
        default_pattern_tables().clone()
    }
}

/// Parse and cache the embedded default tables.
fn default_pattern_tables() -> &'static PatternTables {
    static TABLES: OnceLock<PatternTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        // Deserializing through a helper avoids recursing into `Default`.
        let raw: RawPatternTables = serde_json::from_str(DEFAULT_PATTERNS_JSON)
            .expect("embedded default_patterns.json is valid");
        raw.into()
    })
}

#[derive(Deserialize)]
struct RawPatternTables {
    file_extensions: Vec<String>,
    content_suffixes: Vec<String>,
    content_path_markers: Vec<String>,
    decorative_keywords: Vec<String>,
    chrome_ancestor_tags: Vec<String>,
    chrome_ancestor_classes: Vec<String>,
    content_ancestor_tags: Vec<String>,
    content_ancestor_classes: Vec<String>,
    block_context_tags: Vec<String>,
}

impl From<RawPatternTables> for PatternTables {
    fn from(raw: RawPatternTables) -> Self {
        Self {
            file_extensions: raw.file_extensions,
            content_suffixes: raw.content_suffixes,
            content_path_markers: raw.content_path_markers,
            decorative_keywords: raw.decorative_keywords,
            chrome_ancestor_tags: raw.chrome_ancestor_tags,
            chrome_ancestor_classes: raw.chrome_ancestor_classes,
            content_ancestor_tags: raw.content_ancestor_tags,
            content_ancestor_classes: raw.content_ancestor_classes,
            block_context_tags: raw.block_context_tags,
        }
    }
}

/// Timings, caps and selector lists for the dynamic content revealer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Wait after activating a tab before reading its panel.
    pub tab_settle_ms: u64,
    /// Wait after expanding an accordion toggle.
    pub accordion_settle_ms: u64,
    /// Wait after each carousel "next" click.
    pub carousel_settle_ms: u64,
    /// Wait before returning.
    pub final_settle_ms: u64,
    /// Maximum number of carousel "next" clicks.
    pub carousel_max_advances: usize,
    /// Panel text must be strictly longer than this many chars to be kept.
    pub min_tab_chars: usize,
    /// Leading chars compared by the near-duplicate guard.
    pub duplicate_prefix_chars: usize,
    /// Tab selectors, tried in order; the first with matches wins.
    pub tab_selectors: Vec<String>,
    /// Sub-elements removed from a panel clone before reading its text.
    pub panel_strip_selectors: Vec<String>,
    /// Regexes removed from panel text.
    pub boilerplate_patterns: Vec<String>,
    /// Candidates for the main content region, tried in order.
    pub main_region_selectors: Vec<String>,
    /// Collapsed accordion toggles.
    pub accordion_selector: String,
    /// Ancestors that exclude an accordion toggle.
    pub accordion_chrome_selector: String,
    /// The carousel "next" control.
    pub carousel_next_selector: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            tab_settle_ms: 1500,
            accordion_settle_ms: 300,
            carousel_settle_ms: 500,
            final_settle_ms: 500,
            carousel_max_advances: 20,
            min_tab_chars: 100,
            duplicate_prefix_chars: 200,
            tab_selectors: strings(&[
                r#"[role="tab"]"#,
                r#"button[role="tab"]"#,
                ".tab",
                ".tab-button",
                r#"[class*="tab"]"#,
                r#"button[class*="tab"]"#,
                "[data-tab]",
                "button[data-tab]",
            ]),
            panel_strip_selectors: strings(&[
                "nav",
                "header",
                "footer",
                ".nav",
                ".header",
                ".footer",
                ".navigation",
                r#"[role="navigation"]"#,
                r#"[role="banner"]"#,
                r#"[role="complementary"]"#,
                "script",
                "style",
            ]),
            boilerplate_patterns: strings(&[
                r"(?i)User Guide\s*Cancel",
                r"(?i)Search\s*",
                r"(?i)Get help faster.*?Create an account",
                r"(?i)On this page:.*",
            ]),
            main_region_selectors: strings(&["main", r#"[role="main"]"#, "body"]),
            accordion_selector: r#"button[aria-expanded="false"]"#.to_string(),
            accordion_chrome_selector: "nav, header, footer".to_string(),
            carousel_next_selector: r#"[aria-label*="next" i]"#.to_string(),
        }
    }
}

impl RevealConfig {
    pub fn tab_settle(&self) -> Duration {
        Duration::from_millis(self.tab_settle_ms)
    }

    pub fn accordion_settle(&self) -> Duration {
        Duration::from_millis(self.accordion_settle_ms)
    }

    pub fn carousel_settle(&self) -> Duration {
        Duration::from_millis(self.carousel_settle_ms)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_settle_ms)
    }

    /// Compile the boilerplate patterns, failing on the first invalid one.
    pub fn compile_boilerplate(&self) -> Result<Vec<Regex>, ConfigError> {
        self.boilerplate_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Complete inspector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub patterns: PatternTables,
    pub reveal: RevealConfig,
}

impl InspectConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.reveal.compile_boilerplate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!("loaded inspector config from {}", path.display());
        Ok(config)
    }

    /// Load the file named by `SITEPROBE_CONFIG`, or the defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_path(Path::new(&path)),
            _ => {
                debug!("{CONFIG_ENV_VAR} not set, using built-in inspector config");
                Ok(Self::default())
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
