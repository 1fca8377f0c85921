use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::{Regex, RegexBuilder};

/// Fixed set of buckets discovered URLs are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UrlCategory {
    /// Every discovered URL, no pattern.
    All,
    SensitiveExtensions,
    Images,
    JsFiles,
    OpenRedirect,
    Xss,
    Sql,
    Keys,
}

impl UrlCategory {
    pub const ALL: [UrlCategory; 8] = [
        UrlCategory::All,
        UrlCategory::SensitiveExtensions,
        UrlCategory::Images,
        UrlCategory::JsFiles,
        UrlCategory::OpenRedirect,
        UrlCategory::Xss,
        UrlCategory::Sql,
        UrlCategory::Keys,
    ];

    /// Output file stem (`<stem>.txt`).
    pub fn file_stem(self) -> &'static str {
        match self {
            UrlCategory::All => "salidatodo",
            UrlCategory::SensitiveExtensions => "dataExtensiones",
            UrlCategory::Images => "imagenes",
            UrlCategory::JsFiles => "jsfiles",
            UrlCategory::OpenRedirect => "openRedirect",
            UrlCategory::Xss => "xss",
            UrlCategory::Sql => "sql",
            UrlCategory::Keys => "keys",
        }
    }

    /// Key under `[url_patterns]` in the config; `None` for the catch-all.
    pub fn pattern_key(self) -> Option<&'static str> {
        match self {
            UrlCategory::All => None,
            UrlCategory::SensitiveExtensions => Some("sensitive_ext"),
            UrlCategory::Images => Some("image_ext"),
            UrlCategory::JsFiles => Some("js_files"),
            UrlCategory::OpenRedirect => Some("open_redirect"),
            UrlCategory::Xss => Some("xss"),
            UrlCategory::Sql => Some("sqli"),
            UrlCategory::Keys => Some("keys"),
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[derive(Debug, Clone)]
pub enum CategoryState {
    Enabled(Regex),
    /// Pattern missing from config or failed to compile.
    Disabled(String),
}

/// Compiled, case-insensitive category patterns.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    states: BTreeMap<UrlCategory, CategoryState>,
}

pub type Categorized = BTreeMap<UrlCategory, BTreeSet<String>>;

impl CategoryMatcher {
    pub fn from_patterns(patterns: &BTreeMap<String, String>) -> Self {
        let mut states = BTreeMap::new();
        for category in UrlCategory::ALL {
            let Some(key) = category.pattern_key() else { continue };
            let state = match patterns.get(key) {
                None => CategoryState::Disabled(format!("no pattern configured for '{}'", key)),
                Some(src) => match RegexBuilder::new(src).case_insensitive(true).build() {
                    Ok(re) => CategoryState::Enabled(re),
                    Err(e) => {
                        tracing::error!(key = %key, error = %e, "[URLs] invalid pattern, category disabled");
                        CategoryState::Disabled(e.to_string())
                    }
                },
            };
            states.insert(category, state);
        }
        Self { states }
    }

    pub fn state(&self, category: UrlCategory) -> Option<&CategoryState> {
        self.states.get(&category)
    }

    pub fn is_enabled(&self, category: UrlCategory) -> bool {
        category == UrlCategory::All || matches!(self.state(category), Some(CategoryState::Enabled(_)))
    }

    /// Non-exclusive classification: a URL lands in every category whose
    /// pattern matches anywhere in it, and always in `All`.
    pub fn categorize<I, S>(&self, urls: I) -> Categorized
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Categorized = UrlCategory::ALL.iter().map(|c| (*c, BTreeSet::new())).collect();
        for url in urls {
            let url = url.as_ref();
            for (category, state) in &self.states {
                if let CategoryState::Enabled(re) = state {
                    if re.is_match(url) {
                        out.entry(*category).or_default().insert(url.to_string());
                    }
                }
            }
            out.entry(UrlCategory::All).or_default().insert(url.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn classification_is_non_exclusive() {
        let m = CategoryMatcher::from_patterns(&patterns(&[("js_files", r"\.js"), ("keys", "api_key")]));
        let out = m.categorize(["https://x.com/app.js?api_key=1", "https://x.com/about"]);
        assert_eq!(out[&UrlCategory::JsFiles].len(), 1);
        assert_eq!(out[&UrlCategory::Keys].len(), 1);
        assert_eq!(out[&UrlCategory::All].len(), 2);
    }

    #[test]
    fn matching_ignores_case() {
        let m = CategoryMatcher::from_patterns(&patterns(&[("image_ext", r"\.jpg$")]));
        let out = m.categorize(["https://x.com/A.JPG"]);
        assert!(out[&UrlCategory::Images].contains("https://x.com/A.JPG"));
    }

    #[test]
    fn broken_pattern_disables_only_its_category() {
        let m = CategoryMatcher::from_patterns(&patterns(&[("xss", "(unclosed"), ("sqli", r"\.sql$")]));
        assert!(matches!(m.state(UrlCategory::Xss), Some(CategoryState::Disabled(_))));
        assert!(m.is_enabled(UrlCategory::Sql));
        let out = m.categorize(["https://x.com/(unclosed.sql"]);
        assert!(out[&UrlCategory::Xss].is_empty());
        assert_eq!(out[&UrlCategory::Sql].len(), 1);
    }

    #[test]
    fn all_is_superset_of_every_category() {
        let m = CategoryMatcher::from_patterns(&patterns(&[
            ("sensitive_ext", r"\.(bak|sql|env)"),
            ("open_redirect", r"[?&](next|url|redirect)="),
            ("xss", r"[?&]q="),
        ]));
        let out = m.categorize([
            "https://x.com/db.sql",
            "https://x.com/login?next=/home",
            "https://x.com/search?q=1&url=2",
            "https://x.com/",
        ]);
        let all = &out[&UrlCategory::All];
        for (cat, urls) in &out {
            assert!(urls.is_subset(all), "{cat} not within all");
        }
    }

    #[test]
    fn labels_and_keys() {
        assert_eq!(UrlCategory::Sql.file_stem(), "sql");
        assert_eq!(UrlCategory::Sql.pattern_key(), Some("sqli"));
        assert_eq!(UrlCategory::Images.file_stem(), "imagenes");
        assert_eq!(UrlCategory::All.pattern_key(), None);
    }
}
