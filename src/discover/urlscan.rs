use std::collections::BTreeSet;

use reqwest::Client;
use serde_json::Value;

use crate::error::ReconResult;
use crate::http_client::get_json;

pub const SOURCE: &str = "urlscan.io";

const PARENTS: [&str; 2] = ["task", "page"];
const FIELDS: [&str; 3] = ["domain", "host", "server"];

pub fn urlscan_query_url(base: &str, domain: &str) -> String {
    format!("{}?q=domain:{}", base, urlencoding::encode(domain))
}

pub async fn urlscan_subdomains(client: &Client, base: &str, domain: &str) -> ReconResult<Vec<String>> {
    let v = get_json(client, SOURCE, &urlscan_query_url(base, domain)).await?;
    Ok(hosts_from_results(&v, domain))
}

/// Scan `results[].{task,page}.{domain,host,server}` for names under `domain`.
pub fn hosts_from_results(v: &Value, domain: &str) -> Vec<String> {
    let mut out = BTreeSet::new();
    let results = v.get("results").and_then(|r| r.as_array());
    for result in results.into_iter().flatten() {
        for parent in PARENTS {
            let Some(obj) = result.get(parent) else { continue };
            for field in FIELDS {
                if let Some(name) = obj.get(field).and_then(|n| n.as_str()) {
                    if !name.is_empty() && name.ends_with(domain) {
                        out.insert(name.to_string());
                    }
                }
            }
        }
    }
    out.into_iter().collect()
}
