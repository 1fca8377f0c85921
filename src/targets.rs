use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ReconResult;

/// Reduce a URL or host to its root domain: `https://example.com/x` ->
/// `example.com`, `example.com/` -> `example.com`. The authority of a URL is
/// kept as written, including case, port and userinfo.
pub fn normalize_domain(target: &str) -> String {
    let target = target.trim();
    if let Some((_, rest)) = target.split_once("://") {
        if url::Url::parse(target).is_ok() {
            let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            if end > 0 {
                return rest[..end].to_string();
            }
        }
    }
    target.trim_matches('/').to_string()
}

/// Collect targets from a single value and/or a list file. Blank lines are
/// dropped, the result is deduplicated and sorted. With `normalize` unset,
/// lines are taken verbatim (direct URL mode).
pub fn load_targets(single: Option<&str>, list: Option<&Path>, normalize: bool) -> ReconResult<Vec<String>> {
    let mut raw: Vec<String> = Vec::new();
    if let Some(t) = single {
        raw.push(t.to_string());
    }
    if let Some(path) = list {
        let content = std::fs::read_to_string(path)?;
        raw.extend(content.lines().map(String::from));
    }
    let unique: BTreeSet<String> = raw
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| if normalize { normalize_domain(l) } else { l.to_string() })
        .filter(|l| !l.is_empty())
        .collect();
    Ok(unique.into_iter().collect())
}
