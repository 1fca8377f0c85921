use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use crate::config::{ApiEndpoints, ToolPaths};
use crate::discover::{crtsh, urlscan};
use crate::error::ReconResult;
use crate::external::{output_lines, tools, ToolRunner};
use crate::output::{write_json, write_lines};
use crate::utils::target_file_stem;

/// Upper bound for each local enumeration tool.
pub const RECON_TOOL_TIMEOUT: Duration = Duration::from_secs(300);

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

/// What one discovery source contributed, or why it contributed nothing.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: ReconResult<Vec<String>>,
}

impl SourceOutcome {
    pub fn new(source: &str, result: ReconResult<Vec<String>>) -> Self {
        Self { source: source.to_string(), result }
    }

    pub fn count(&self) -> usize {
        self.result.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct ReconReport {
    pub target: String,
    /// Sorted, deduplicated, wildcard-free.
    pub subdomains: Vec<String>,
    /// Entries dropped because they contained `*`.
    pub wildcards: Vec<String>,
    pub outcomes: Vec<SourceOutcome>,
}

impl ReconReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.source.as_str(), e.to_string())))
    }
}

/// Union every successful source, then split off wildcard entries.
/// Returns `(subdomains, wildcards)`, both sorted.
pub fn merge_outcomes(outcomes: &[SourceOutcome]) -> (Vec<String>, Vec<String>) {
    let all: BTreeSet<&str> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .flatten()
        .map(String::as_str)
        .collect();
    let (wildcards, clean): (Vec<&str>, Vec<&str>) = all.into_iter().partition(|s| s.contains('*'));
    (
        clean.into_iter().map(String::from).collect(),
        wildcards.into_iter().map(String::from).collect(),
    )
}

/// Parse subdominator stdout: strip colour codes, skip banner lines, keep
/// names under `domain`.
pub fn parse_subdominator_output(output: &str, domain: &str) -> Vec<String> {
    let clean = ANSI_ESCAPE.replace_all(output, "");
    let found: BTreeSet<String> = output_lines(&clean)
        .filter(|l| !l.starts_with('[') && !l.starts_with('_') && !l.starts_with('|'))
        .filter(|l| l.ends_with(domain))
        .map(String::from)
        .collect();
    found.into_iter().collect()
}

/// Passive subdomain discovery for one root domain across local tools and
/// public APIs.
pub struct SubdomainEnumerator<'a> {
    runner: &'a ToolRunner,
    tools: &'a ToolPaths,
    api: &'a ApiEndpoints,
    client: Client,
}

impl<'a> SubdomainEnumerator<'a> {
    pub fn new(runner: &'a ToolRunner, tools: &'a ToolPaths, api: &'a ApiEndpoints, client: Client) -> Self {
        Self { runner, tools, api, client }
    }

    /// Query every source, merge, and persist to `output_dir` when anything
    /// was found. Individual source failures are recorded on the report.
    pub async fn enumerate(&self, domain: &str, output_dir: Option<&Path>) -> ReconReport {
        tracing::info!(target = %domain, "[Recon] starting passive reconnaissance");

        let outcomes = vec![
            SourceOutcome::new("subdominator", self.run_subdominator(domain).await),
            SourceOutcome::new("subfinder", self.run_subfinder(domain).await),
            SourceOutcome::new("amass", self.run_amass(domain).await),
            SourceOutcome::new(
                urlscan::SOURCE,
                urlscan::urlscan_subdomains(&self.client, &self.api.urlscan_url, domain).await,
            ),
            SourceOutcome::new(
                crtsh::SOURCE,
                crtsh::crtsh_subdomains(&self.client, &self.api.crtsh_url, domain).await,
            ),
        ];

        for o in &outcomes {
            match &o.result {
                Ok(found) => tracing::info!(source = %o.source, "[Recon] {} subdomains found", found.len()),
                Err(e) => tracing::error!(source = %o.source, error = %e, "[Recon] source failed"),
            }
        }

        let (subdomains, wildcards) = merge_outcomes(&outcomes);
        if !wildcards.is_empty() {
            tracing::info!("[Recon] filtered {} wildcard entries", wildcards.len());
        }
        tracing::info!(target = %domain, "[Recon] {} unique valid subdomains", subdomains.len());

        let report = ReconReport { target: domain.to_string(), subdomains, wildcards, outcomes };
        if let Some(dir) = output_dir {
            if !report.subdomains.is_empty() {
                match save_subdomains(dir, domain, &report.subdomains) {
                    Ok((txt, json)) => tracing::info!(
                        "[Recon] subdomains saved to {} and {}",
                        txt.display(),
                        json.display()
                    ),
                    Err(e) => tracing::error!(error = %e, "[Recon] failed to save subdomains"),
                }
            }
        }
        report
    }

    async fn run_subdominator(&self, domain: &str) -> ReconResult<Vec<String>> {
        let cmd = tools::subdominator(self.tools, domain)?;
        tracing::info!("[Subdominator] running (timeout {}s)", RECON_TOOL_TIMEOUT.as_secs());
        let stdout = self.runner.execute(&cmd, Some(RECON_TOOL_TIMEOUT)).await?;
        Ok(parse_subdominator_output(&stdout, domain))
    }

    async fn run_subfinder(&self, domain: &str) -> ReconResult<Vec<String>> {
        let out_file = tempfile::Builder::new().prefix("subfinder_").tempfile()?;
        let cmd = tools::subfinder(self.tools, domain, out_file.path())?;
        tracing::info!("[Subfinder] running (timeout {}s)", RECON_TOOL_TIMEOUT.as_secs());
        self.runner.execute(&cmd, Some(RECON_TOOL_TIMEOUT)).await?;
        let text = tokio::fs::read_to_string(out_file.path()).await?;
        Ok(output_lines(&text).map(String::from).collect())
    }

    async fn run_amass(&self, domain: &str) -> ReconResult<Vec<String>> {
        let cmd = tools::amass(self.tools, domain)?;
        tracing::info!("[Amass] running (timeout {}s)", RECON_TOOL_TIMEOUT.as_secs());
        let stdout = self.runner.execute(&cmd, Some(RECON_TOOL_TIMEOUT)).await?;
        Ok(output_lines(&stdout).map(String::from).collect())
    }
}

/// Writes `<stem>_subdomains.txt` and `<stem>_subdomains.json`.
pub fn save_subdomains(dir: &Path, target: &str, subdomains: &[String]) -> std::io::Result<(PathBuf, PathBuf)> {
    let stem = target_file_stem(target);
    let txt = dir.join(format!("{}_subdomains.txt", stem));
    let json = dir.join(format!("{}_subdomains.json", stem));
    write_lines(&txt, subdomains)?;
    write_json(&json, subdomains)?;
    Ok((txt, json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;

    fn ok(source: &str, names: &[&str]) -> SourceOutcome {
        SourceOutcome::new(source, Ok(names.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn merge_drops_wildcards_and_dedups() {
        let outcomes = vec![
            ok("a", &["a.example.com"]),
            ok("b", &["b.example.com", "*.example.com", "a.example.com"]),
            SourceOutcome::new("c", Err(ReconError::ToolNotFound { tool: "amass".into() })),
        ];
        let (clean, wild) = merge_outcomes(&outcomes);
        assert_eq!(clean, vec!["a.example.com", "b.example.com"]);
        assert_eq!(wild, vec!["*.example.com"]);
    }

    #[test]
    fn merge_partitions_the_union() {
        let outcomes = vec![
            ok("a", &["x.example.com", "*.x.example.com"]),
            ok("b", &["y.example.com", "x.example.com", "w*.example.com"]),
        ];
        let union: BTreeSet<String> = outcomes
            .iter()
            .flat_map(|o| o.result.as_ref().unwrap().clone())
            .collect();
        let (clean, wild) = merge_outcomes(&outcomes);
        assert!(clean.iter().all(|s| !s.contains('*')));
        let rebuilt: BTreeSet<String> = clean.into_iter().chain(wild).collect();
        assert_eq!(rebuilt, union);
    }

    #[test]
    fn all_sources_failing_is_empty_not_error() {
        let outcomes = vec![
            SourceOutcome::new("crt.sh", Err(ReconError::network("crt.sh", "HTTP 503"))),
            SourceOutcome::new("amass", Err(ReconError::ToolNotFound { tool: "amass".into() })),
        ];
        let (clean, wild) = merge_outcomes(&outcomes);
        assert!(clean.is_empty() && wild.is_empty());
        let report = ReconReport { outcomes, ..Default::default() };
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn subdominator_banner_is_skipped() {
        let out = "\x1b[32m[INF]\x1b[0m loading\n|  banner |\n__ ascii\napi.example.com\n\x1b[1mdev.example.com\x1b[0m\nexample.org\napi.example.com\n";
        assert_eq!(
            parse_subdominator_output(out, "example.com"),
            vec!["api.example.com", "dev.example.com"]
        );
    }

    #[test]
    fn save_writes_txt_and_json() {
        let tmp = tempfile::tempdir().unwrap();
        let subs = vec!["a.example.com".to_string(), "b.example.com".to_string()];
        let (txt, json) = save_subdomains(tmp.path(), "example.com", &subs).unwrap();
        assert!(txt.ends_with("example_com_subdomains.txt"));
        assert_eq!(std::fs::read_to_string(txt).unwrap(), "a.example.com\nb.example.com");
        let back: Vec<String> = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(back, subs);
    }
}
