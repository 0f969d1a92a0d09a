use serde::{Deserialize, Serialize};
use url::Url;

/// Seeded into the store on first start so a fresh install classifies the
/// common cases out of the box.
pub const DEFAULT_PRODUCTIVE_SITES: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "docs.google.com",
    "notion.so",
    "trello.com",
    "calendar.google.com",
];

pub const DEFAULT_UNPRODUCTIVE_SITES: &[&str] = &[
    "youtube.com",
    "netflix.com",
    "twitter.com",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
    "reddit.com",
];

/// User-editable list of domain fragments. Entries keep their insertion
/// order for display and never repeat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteList {
    entries: Vec<String>,
}

impl SiteList {
    pub fn from_entries(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            list.add(entry.into());
        }
        list
    }

    /// Returns false when the entry was already present.
    pub fn add(&mut self, entry: String) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Returns false when there was nothing to remove.
    pub fn remove(&mut self, entry: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != entry);
        before != self.entries.len()
    }

    /// Substring containment of an entry within the domain. This lets
    /// "google.com" cover "docs.google.com", and also lets an entry like "a"
    /// match nearly everything. The caller lowercases entries at input time.
    pub fn matches(&self, domain: &str) -> bool {
        self.entries.iter().any(|entry| domain.contains(entry))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Decision for a freshly observed domain. `Unchanged` means neither list
/// claimed the domain and the idle timer keeps driving the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Productive,
    Unproductive,
    Unchanged,
}

/// The unproductive list wins when a domain appears on both.
pub fn classify(domain: &str, productive: &SiteList, unproductive: &SiteList) -> Classification {
    if unproductive.matches(domain) {
        Classification::Unproductive
    } else if productive.matches(domain) {
        Classification::Productive
    } else {
        Classification::Unchanged
    }
}

/// Hostname of the URL. Extraction fails closed: an unparsable URL is used
/// verbatim, which simply won't match any list entry.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> SiteList {
        SiteList::from_entries(entries.iter().copied())
    }

    #[test]
    fn test_unproductive_list_wins_over_productive() {
        let productive = list(&["google.com"]);
        let unproductive = list(&["google.com"]);

        assert_eq!(
            classify("docs.google.com", &productive, &unproductive),
            Classification::Unproductive
        );
    }

    #[test]
    fn test_partial_domain_entries_match_subdomains() {
        let productive = list(&["google.com"]);
        let unproductive = list(&["youtube.com"]);

        assert_eq!(
            classify("docs.google.com", &productive, &unproductive),
            Classification::Productive
        );
        assert_eq!(
            classify("www.youtube.com", &productive, &unproductive),
            Classification::Unproductive
        );
    }

    #[test]
    fn test_unlisted_domain_is_unchanged() {
        let productive = list(&["github.com"]);
        let unproductive = list(&["youtube.com"]);

        assert_eq!(
            classify("example.org", &productive, &unproductive),
            Classification::Unchanged
        );
    }

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let mut sites = list(&["github.com"]);

        assert!(!sites.add("github.com".into()));
        assert!(sites.add("notion.so".into()));
        assert_eq!(sites.entries(), ["github.com", "notion.so"]);

        assert!(sites.remove("github.com"));
        assert!(!sites.remove("github.com"));
        assert_eq!(sites.entries(), ["notion.so"]);
    }

    #[test]
    fn test_extract_domain_falls_back_to_raw_string() {
        assert_eq!(
            extract_domain("https://youtube.com/watch?v=1"),
            "youtube.com"
        );
        assert_eq!(extract_domain("not a url"), "not a url");
        assert_eq!(extract_domain(""), "");
    }
}
