use std::collections::BTreeSet;

use reqwest::Client;
use serde_json::Value;

use crate::error::ReconResult;
use crate::http_client::get_json;

pub const SOURCE: &str = "crt.sh";

pub fn crtsh_query_url(base: &str, domain: &str) -> String {
    let q = format!("%.{}", domain);
    format!("{}?q={}&output=json", base, urlencoding::encode(&q))
}

pub async fn crtsh_subdomains(client: &Client, base: &str, domain: &str) -> ReconResult<Vec<String>> {
    let v = get_json(client, SOURCE, &crtsh_query_url(base, domain)).await?;
    Ok(names_from_certificates(&v, domain))
}

/// Hostnames from the `name_value` field of each certificate entry.
/// `name_value` can contain multiple names separated by newlines.
pub fn names_from_certificates(v: &Value, domain: &str) -> Vec<String> {
    let mut out = BTreeSet::new();
    if let Some(arr) = v.as_array() {
        for item in arr {
            if let Some(names) = item.get("name_value").and_then(|n| n.as_str()) {
                for n in names.split('\n') {
                    let s = n.trim();
                    if !s.is_empty() && s.ends_with(domain) {
                        out.insert(s.to_string());
                    }
                }
            }
        }
    }
    out.into_iter().collect()
}
