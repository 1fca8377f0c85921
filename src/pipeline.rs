use std::path::{Path, PathBuf};

use reqwest::Client;

use crate::config::Config;
use crate::discover::SubdomainEnumerator;
use crate::external::ToolRunner;
use crate::filter::CategoryMatcher;
use crate::gather::UrlFinder;
use crate::probe::{HostProber, ProbeMode};
use crate::utils::{ensure_dir, target_file_stem};

/// Scan modules as selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleFlags {
    pub recon1: bool,
    pub recon2: bool,
    pub recon3: bool,
    pub subdomains: bool,
    pub urls: bool,
    pub all: bool,
}

impl ModuleFlags {
    pub fn any(&self) -> bool {
        self.recon1 || self.recon2 || self.recon3 || self.subdomains || self.urls || self.all
    }

    fn any_discovery(&self) -> bool {
        self.recon1 || self.recon2 || self.recon3 || self.subdomains || self.all
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePlan {
    /// Per-target discovery. Probing and URL discovery are independent
    /// switches; URL discovery runs over live hosts when probing ran, or over
    /// the raw subdomains otherwise.
    Recon { probe: Option<ProbeMode>, urls: bool },
    /// URL discovery only, over the input list as given.
    DirectUrls,
}

impl PipelinePlan {
    /// `None` when no module was selected.
    pub fn from_flags(flags: &ModuleFlags) -> Option<Self> {
        if !flags.any() {
            return None;
        }
        if !flags.any_discovery() {
            return Some(PipelinePlan::DirectUrls);
        }
        let probe = if flags.recon3 {
            Some(ProbeMode::Fast)
        } else if flags.recon2 || flags.all {
            Some(ProbeMode::Full)
        } else if flags.recon1 {
            Some(ProbeMode::Light)
        } else {
            None
        };
        Some(PipelinePlan::Recon { probe, urls: flags.urls || flags.all })
    }

    /// Direct mode takes targets verbatim; discovery normalizes them to
    /// root domains.
    pub fn normalizes_targets(&self) -> bool {
        matches!(self, PipelinePlan::Recon { .. })
    }
}

/// Knobs passed through to the prober and API client.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub threads: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// `<default_output_dir>/<name>` when a name is given, otherwise a
/// timestamped run directory under `outputs/`.
pub fn resolve_output_root(config: &Config, name: Option<&str>) -> PathBuf {
    match name {
        Some(name) => config.recon.default_output_dir.join(name),
        None => PathBuf::from("outputs").join(format!("run_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TargetSummary {
    pub target: String,
    pub subdomains: usize,
    pub live_hosts: usize,
    pub url_hosts: usize,
    pub failed_sources: Vec<(String, String)>,
}

pub struct Pipeline {
    config: Config,
    runner: ToolRunner,
    client: Client,
    settings: RunSettings,
    output_root: PathBuf,
    matcher: CategoryMatcher,
}

impl Pipeline {
    pub fn new(config: Config, runner: ToolRunner, client: Client, settings: RunSettings, output_root: PathBuf) -> Self {
        let matcher = CategoryMatcher::from_patterns(&config.url_patterns);
        Self { config, runner, client, settings, output_root, matcher }
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub async fn run(&self, targets: &[String], plan: PipelinePlan) -> anyhow::Result<Vec<TargetSummary>> {
        match plan {
            PipelinePlan::Recon { probe, urls } => {
                tracing::info!("[+] starting in reconnaissance mode");
                let mut summaries = Vec::with_capacity(targets.len());
                for target in targets {
                    match self.run_target(target, probe, urls).await {
                        Ok(summary) => summaries.push(summary),
                        Err(e) => tracing::error!(target = %target, error = %e, "target aborted"),
                    }
                }
                Ok(summaries)
            }
            PipelinePlan::DirectUrls => {
                tracing::info!("[+] starting in direct mode (URLs only)");
                self.run_direct(targets).await.map(|s| s.into_iter().collect())
            }
        }
    }

    /// Recon, then probing, then URL discovery for one root domain. Each
    /// stage that yields nothing ends the pipeline for this target.
    async fn run_target(&self, target: &str, probe: Option<ProbeMode>, urls: bool) -> anyhow::Result<TargetSummary> {
        let dir = self.output_root.join(target_file_stem(target));
        ensure_dir(&dir)?;
        tracing::info!(target = %target, "starting scan, results in {}", dir.display());

        let enumerator = SubdomainEnumerator::new(&self.runner, &self.config.tools, &self.config.api, self.client.clone());
        let recon = enumerator.enumerate(target, Some(&dir)).await;
        let mut summary = TargetSummary {
            target: target.to_string(),
            subdomains: recon.subdomains.len(),
            failed_sources: recon.failures().map(|(s, e)| (s.to_string(), e)).collect(),
            ..Default::default()
        };

        let hosts = match probe {
            Some(mode) if !recon.subdomains.is_empty() => {
                let prober = HostProber::new(&self.runner, &self.config.tools, self.settings.threads, self.settings.timeout_secs);
                let report = prober.probe(target, &recon.subdomains, mode, &dir).await;
                summary.live_hosts = report.live_urls.len();
                report.live_urls
            }
            Some(_) => Vec::new(),
            None => recon.subdomains.clone(),
        };

        if urls && !hosts.is_empty() {
            let finder = UrlFinder::new(&self.runner, &self.config.tools, &self.matcher);
            let report = finder.run(target, &hosts, &dir).await;
            summary.url_hosts = report.saved.len();
        }

        for (source, reason) in &summary.failed_sources {
            tracing::warn!(target = %target, source = %source, "source contributed nothing: {}", reason);
        }
        tracing::info!(target = %target, "scan finished");
        Ok(summary)
    }

    async fn run_direct(&self, targets: &[String]) -> anyhow::Result<Option<TargetSummary>> {
        if targets.is_empty() {
            tracing::warn!("[!] input list is empty, nothing to process");
            return Ok(None);
        }
        ensure_dir(&self.output_root)?;
        let project = self
            .output_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        tracing::info!(project = %project, "results in {}", self.output_root.display());

        let finder = UrlFinder::new(&self.runner, &self.config.tools, &self.matcher);
        let report = finder.run(&project, targets, &self.output_root).await;
        tracing::info!(project = %project, "URL processing finished");
        Ok(Some(TargetSummary { target: project, url_hosts: report.saved.len(), ..Default::default() }))
    }
}
