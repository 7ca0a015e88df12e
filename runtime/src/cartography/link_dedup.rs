//! Order-stable deduplication of classified links.

use crate::cartography::url_classifier::LinkRecord;
use std::collections::HashSet;

/// Deduplication key: href without fragment and without trailing `/`.
///
/// Every trailing slash goes, so a key is its own key.
pub fn dedup_key(href: &str) -> &str {
    let without_fragment = href.split('#').next().unwrap_or(href);
    without_fragment.trim_end_matches('/')
}

/// Keep the first record per key, in first-seen order, rewriting each
/// surviving `href` to its key.
pub fn dedup_links<I>(links: I) -> Vec<LinkRecord>
where
    I: IntoIterator<Item = LinkRecord>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|mut link| {
            let key = dedup_key(&link.href).to_string();
            if !seen.insert(key.clone()) {
                return None;
            }
            link.href = key;
            Some(link)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(href: &str, text: &str) -> LinkRecord {
        LinkRecord {
            href: href.to_string(),
            text: text.to_string(),
            is_internal: true,
            is_file_download: false,
            file_type: None,
            original_href: href.to_string(),
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let links = vec![
            record("https://x.test/a/", "first"),
            record("https://x.test/b", "b"),
            record("https://x.test/a", "second"),
            record("https://x.test/a#frag", "third"),
        ];
        let unique = dedup_links(links);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].href, "https://x.test/a");
        assert_eq!(unique[0].text, "first");
        assert_eq!(unique[0].original_href, "https://x.test/a/");
        assert_eq!(unique[1].href, "https://x.test/b");
    }

    #[test]
    fn test_idempotent() {
        let links = vec![
            record("https://x.test/", "home"),
            record("https://x.test/docs/", "docs"),
            record("https://x.test/docs", "docs again"),
            record("https://x.test/help", "help"),
        ];
        let once = dedup_links(links);
        let twice = dedup_links(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once[0].href, "https://x.test");
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(dedup_key("https://x.test/a//"), "https://x.test/a");
        assert_eq!(dedup_key("https://x.test/a/#top"), "https://x.test/a");
        let key = dedup_key("https://x.test/a//");
        assert_eq!(dedup_key(key), key);
    }
}
