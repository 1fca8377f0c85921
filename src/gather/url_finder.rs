use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolPaths;
use crate::error::ReconResult;
use crate::external::{output_lines, tools, ToolCommand, ToolRunner};
use crate::filter::{Categorized, CategoryMatcher};
use crate::output::write_lines;
use crate::utils::{ensure_dir, host_dir_name};

/// Upper bound for each URL-discovery tool run against a single host.
pub const URL_TOOL_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUrls {
    pub host: String,
    pub url_count: usize,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct UrlReport {
    pub saved: Vec<HostUrls>,
    /// Hosts for which no tool returned anything.
    pub empty: Vec<String>,
    /// Hosts whose results could not be written, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Runs gau and katana per host and files the URLs into category files.
pub struct UrlFinder<'a> {
    runner: &'a ToolRunner,
    tools: &'a ToolPaths,
    matcher: &'a CategoryMatcher,
}

impl<'a> UrlFinder<'a> {
    pub fn new(runner: &'a ToolRunner, tools: &'a ToolPaths, matcher: &'a CategoryMatcher) -> Self {
        Self { runner, tools, matcher }
    }

    /// Hosts are handled one at a time, in the given order. A failure on one
    /// host never stops the rest.
    pub async fn run(&self, project: &str, hosts: &[String], base_dir: &Path) -> UrlReport {
        let mut report = UrlReport::default();
        if hosts.is_empty() {
            tracing::warn!(project = %project, "[URLs] no hosts to process");
            return report;
        }
        tracing::info!(project = %project, "[URLs] processing {} hosts", hosts.len());

        for host in hosts {
            tracing::info!(host = %host, "[URLs] processing host");
            let urls = self.find_urls(host).await;
            if urls.is_empty() {
                tracing::info!(host = %host, "[URLs] no URLs found");
                report.empty.push(host.clone());
                continue;
            }
            tracing::info!(host = %host, "[URLs] {} URLs found, saving", urls.len());

            let dir = base_dir.join(host_dir_name(host));
            let categorized = self.matcher.categorize(&urls);
            match save_categorized(&dir, &categorized) {
                Ok(()) => {
                    tracing::info!(host = %host, "[URLs] results saved to {}", dir.display());
                    report.saved.push(HostUrls { host: host.clone(), url_count: urls.len(), directory: dir });
                }
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "[URLs] failed to save results");
                    report.failed.push((host.clone(), e.to_string()));
                }
            }
        }
        tracing::info!(project = %project, "[URLs] all hosts processed");
        report
    }

    /// Union of gau and katana output for one host. Tool failures are logged
    /// and contribute nothing.
    pub async fn find_urls(&self, host: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let commands: [(&str, ReconResult<ToolCommand>); 2] = [
            ("gau", tools::gau(self.tools, host)),
            ("katana", tools::katana(self.tools, host)),
        ];
        for (name, cmd) in commands {
            tracing::info!(host = %host, "[URLs] searching with {}", name);
            let res = match cmd {
                Ok(cmd) => self.runner.execute(&cmd, Some(URL_TOOL_TIMEOUT)).await,
                Err(e) => Err(e),
            };
            match res {
                Ok(stdout) => {
                    let before = found.len();
                    found.extend(output_lines(&stdout).map(String::from));
                    tracing::info!(tool = %name, "[URLs] {} new URLs", found.len() - before);
                }
                Err(e) => tracing::error!(tool = %name, host = %host, error = %e, "[URLs] tool failed"),
            }
        }
        found
    }
}

/// One `<category>.txt` per non-empty category, sorted. A failed write does
/// not stop the remaining categories; the first error is returned at the end.
pub fn save_categorized(dir: &Path, categorized: &Categorized) -> std::io::Result<()> {
    ensure_dir(dir)?;
    let mut first_err = None;
    for (category, urls) in categorized {
        if urls.is_empty() {
            continue;
        }
        let lines: Vec<&String> = urls.iter().collect();
        let path = dir.join(format!("{}.txt", category.file_stem()));
        if let Err(e) = write_lines(&path, &lines) {
            tracing::error!(path = %path.display(), error = %e, "[URLs] could not write category file");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
