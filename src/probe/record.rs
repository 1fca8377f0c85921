use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReconError, ReconResult};

/// One httpx result, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub url: String,
    /// The candidate as it was fed to the prober.
    pub host: String,
    /// Resolved address.
    pub ip: String,
    pub scheme: String,
    pub port: u16,
    pub status_code: u16,
    pub title: String,
    /// Deduplicated and sorted.
    pub tech: Vec<String>,
    pub content_type: String,
    pub response_size: u64,
    pub cname: Vec<String>,
    pub cdn: bool,
    #[serde(skip)]
    failed: bool,
}

impl ProbeRecord {
    /// Reachable: the prober reported no failure and a real status code.
    pub fn is_positive(&self) -> bool {
        !self.failed && self.status_code > 0
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// httpx emits some numeric fields as strings (`"port": "443"`).
fn num_field(v: &Value, key: &str) -> u64 {
    match v.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn str_list(v: &Value, key: &str) -> Vec<String> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}

/// Parse one line of httpx JSON output.
pub fn parse_httpx_line(line: &str) -> ReconResult<ProbeRecord> {
    let v: Value = serde_json::from_str(line).map_err(|e| ReconError::parse("httpx json line", e))?;
    if !v.is_object() {
        return Err(ReconError::parse("httpx json line", "not an object"));
    }
    let mut tech = str_list(&v, "tech");
    tech.sort();
    tech.dedup();
    Ok(ProbeRecord {
        url: str_field(&v, "url"),
        host: str_field(&v, "input"),
        ip: str_field(&v, "host"),
        scheme: str_field(&v, "scheme"),
        port: u16::try_from(num_field(&v, "port")).unwrap_or(0),
        status_code: u16::try_from(num_field(&v, "status_code")).unwrap_or(0),
        title: str_field(&v, "title"),
        tech,
        content_type: str_field(&v, "content_type"),
        response_size: num_field(&v, "content_length"),
        cname: str_list(&v, "cname"),
        cdn: v.get("cdn").and_then(Value::as_bool).unwrap_or(false),
        failed: v.get("failed").and_then(Value::as_bool).unwrap_or(true),
    })
}
