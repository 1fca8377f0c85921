use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::config::ToolPaths;
use crate::error::ReconResult;
use crate::external::{output_lines, tools, ToolRunner};
use crate::output::{write_json, write_lines};
use crate::probe::record::{parse_httpx_line, ProbeRecord};
use crate::utils::target_file_stem;

/// Lower bound for a whole httpx run, however small the host list.
pub const PROBE_TOOL_TIMEOUT_FLOOR: Duration = Duration::from_secs(600);

/// Upper bound for one httpx run: every host/port pair gets its per-request
/// timeout twice (one retry), spread across `threads` workers.
pub fn probe_run_timeout(hosts: usize, mode: ProbeMode, threads: usize, per_request_secs: u64) -> Duration {
    let ports = mode.ports().map(|p| p.split(',').count()).unwrap_or(2);
    let requests = (hosts * ports) as u64;
    let batches = requests.div_ceil(threads.max(1) as u64);
    let bound = Duration::from_secs(batches.saturating_mul(per_request_secs.saturating_mul(2)));
    bound.max(PROBE_TOOL_TIMEOUT_FLOOR)
}

/// How deep httpx digs into each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// JSON output on the four common web ports.
    Light,
    /// JSON output on the extended port list.
    Full,
    /// Plain live-URL list, no content extraction.
    Fast,
}

impl ProbeMode {
    pub fn ports(self) -> Option<&'static str> {
        match self {
            ProbeMode::Light => Some(tools::PORTS_LIGHT),
            ProbeMode::Full => Some(tools::PORTS_FULL),
            ProbeMode::Fast => None,
        }
    }
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeMode::Light => "LIGHT",
            ProbeMode::Full => "FULL",
            ProbeMode::Fast => "FAST",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub positives: Vec<ProbeRecord>,
    pub negatives: Vec<ProbeRecord>,
    /// URLs handed to URL discovery: positive record URLs, or the raw live
    /// list in fast mode.
    pub live_urls: Vec<String>,
}

impl ProbeReport {
    /// Split parsed httpx JSON lines into positives and negatives. Lines that
    /// fail to parse are logged and skipped.
    pub fn from_json_lines(stdout: &str) -> Self {
        let mut report = Self::default();
        for line in output_lines(stdout) {
            match parse_httpx_line(line) {
                Ok(rec) if rec.is_positive() => report.positives.push(rec),
                Ok(rec) => report.negatives.push(rec),
                Err(e) => tracing::warn!(error = %e, "[Probing] skipping httpx line"),
            }
        }
        let mut live: Vec<String> = report.positives.iter().map(|r| r.url.clone()).collect();
        live.sort();
        report.live_urls = live;
        report
    }

    /// Fast mode: one reachable URL per line, nothing negative.
    pub fn from_live_list(stdout: &str) -> Self {
        let mut live: Vec<String> = output_lines(stdout).map(String::from).collect();
        live.sort();
        Self { live_urls: live, ..Default::default() }
    }

    /// Deduplicated, sorted hosts of the negative records.
    pub fn negative_hosts(&self) -> Vec<String> {
        let hosts: BTreeSet<&str> = self.negatives.iter().map(|r| r.host.as_str()).collect();
        hosts.into_iter().map(String::from).collect()
    }
}

pub struct HostProber<'a> {
    runner: &'a ToolRunner,
    tools: &'a ToolPaths,
    threads: usize,
    timeout_secs: u64,
    run_timeout: Option<Duration>,
}

impl<'a> HostProber<'a> {
    pub fn new(runner: &'a ToolRunner, tools: &'a ToolPaths, threads: usize, timeout_secs: u64) -> Self {
        Self { runner, tools, threads, timeout_secs, run_timeout: None }
    }

    /// Fixed bound for the httpx run instead of [`probe_run_timeout`].
    pub fn with_run_timeout(mut self, limit: Duration) -> Self {
        self.run_timeout = Some(limit);
        self
    }

    /// Probe `hosts` once with httpx and persist the result under
    /// `output_dir`. An empty host list returns immediately without touching
    /// the filesystem; a failing httpx run yields an empty report.
    pub async fn probe(&self, target: &str, hosts: &[String], mode: ProbeMode, output_dir: &Path) -> ProbeReport {
        if hosts.is_empty() {
            tracing::info!("[Probing] no subdomains to probe");
            return ProbeReport::default();
        }
        tracing::info!("[Probing] starting {} probe of {} targets", mode, hosts.len());

        let report = match self.run_httpx(hosts, mode).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "[Probing] httpx run failed");
                return ProbeReport::default();
            }
        };

        if let Err(e) = save_probe_results(output_dir, target, mode, &report) {
            tracing::error!(error = %e, "[Probing] failed to save results");
        } else {
            tracing::info!(
                "[Probing] {} live, {} negative, saved to {}",
                report.live_urls.len(),
                report.negatives.len(),
                output_dir.display()
            );
        }
        report
    }

    async fn run_httpx(&self, hosts: &[String], mode: ProbeMode) -> ReconResult<ProbeReport> {
        let mut input = tempfile::Builder::new().prefix("targets_").tempfile()?;
        input.write_all(hosts.join("\n").as_bytes())?;
        input.flush()?;

        let cmd = tools::httpx(self.tools, input.path(), self.threads, self.timeout_secs, mode.ports())?;
        tracing::debug!(command = %cmd.display(), "[Probing] httpx command");
        let limit = self
            .run_timeout
            .unwrap_or_else(|| probe_run_timeout(hosts.len(), mode, self.threads, self.timeout_secs));
        let stdout = self.runner.execute(&cmd, Some(limit)).await?;

        Ok(match mode {
            ProbeMode::Fast => ProbeReport::from_live_list(&stdout),
            ProbeMode::Light | ProbeMode::Full => ProbeReport::from_json_lines(&stdout),
        })
    }
}

/// Fast mode writes `<stem>_positives.txt` and an empty `<stem>_negativos.txt`;
/// the rich modes add JSON arrays of the full records.
pub fn save_probe_results(dir: &Path, target: &str, mode: ProbeMode, report: &ProbeReport) -> std::io::Result<()> {
    let stem = target_file_stem(target);
    let pos_txt = dir.join(format!("{}_positives.txt", stem));
    let neg_txt = dir.join(format!("{}_negativos.txt", stem));

    write_lines(&pos_txt, &report.live_urls)?;
    if mode == ProbeMode::Fast {
        // kept so every mode leaves the same file layout
        write_lines::<String>(&neg_txt, &[])?;
        return Ok(());
    }
    write_lines(&neg_txt, &report.negative_hosts())?;
    write_json(&dir.join(format!("{}_positives.json", stem)), &report.positives)?;
    write_json(&dir.join(format!("{}_negativos.json", stem)), &report.negatives)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTTPX_OUT: &str = r#"{"url":"https://b.example.com","input":"b.example.com","status_code":200,"failed":false}
{"url":"http://a.example.com","input":"a.example.com","status_code":301,"failed":false}
not-json
{"input":"c.example.com","failed":true}
{"input":"c.example.com","failed":true,"port":"8443"}
"#;

    #[test]
    fn json_lines_partition_is_exhaustive_and_disjoint() {
        let report = ProbeReport::from_json_lines(HTTPX_OUT);
        assert_eq!(report.positives.len(), 2);
        assert_eq!(report.negatives.len(), 2);
        assert!(report.positives.iter().all(ProbeRecord::is_positive));
        assert!(report.negatives.iter().all(|r| !r.is_positive()));
        assert_eq!(report.live_urls, vec!["http://a.example.com", "https://b.example.com"]);
        assert_eq!(report.negative_hosts(), vec!["c.example.com"]);
    }

    #[test]
    fn live_list_has_no_negatives() {
        let report = ProbeReport::from_live_list("https://z.example.com\n\nhttp://a.example.com\n");
        assert_eq!(report.live_urls, vec!["http://a.example.com", "https://z.example.com"]);
        assert!(report.negatives.is_empty() && report.positives.is_empty());
    }

    #[test]
    fn fast_mode_files() {
        let tmp = tempfile::tempdir().unwrap();
        let report = ProbeReport::from_live_list("http://a.example.com\n");
        save_probe_results(tmp.path(), "example.com", ProbeMode::Fast, &report).unwrap();
        let pos = std::fs::read_to_string(tmp.path().join("example_com_positives.txt")).unwrap();
        let neg = std::fs::read_to_string(tmp.path().join("example_com_negativos.txt")).unwrap();
        assert_eq!(pos, "http://a.example.com");
        assert_eq!(neg, "");
        assert!(!tmp.path().join("example_com_positives.json").exists());
    }

    #[test]
    fn rich_mode_files() {
        let tmp = tempfile::tempdir().unwrap();
        let report = ProbeReport::from_json_lines(HTTPX_OUT);
        save_probe_results(tmp.path(), "example.com", ProbeMode::Light, &report).unwrap();
        let neg = std::fs::read_to_string(tmp.path().join("example_com_negativos.txt")).unwrap();
        assert_eq!(neg, "c.example.com");
        let pos: Vec<ProbeRecord> = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join("example_com_positives.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(pos.len(), 2);
    }

    #[test]
    fn run_timeout_scales_with_work() {
        assert_eq!(probe_run_timeout(3, ProbeMode::Fast, 5, 30), PROBE_TOOL_TIMEOUT_FLOOR);
        // 1000 hosts x 4 ports over 5 threads = 800 batches of 60s
        assert_eq!(probe_run_timeout(1000, ProbeMode::Light, 5, 30), Duration::from_secs(48_000));
        assert_eq!(probe_run_timeout(1000, ProbeMode::Light, 0, 30), Duration::from_secs(240_000));
    }

    #[tokio::test]
    async fn no_hosts_means_no_work() {
        let runner = ToolRunner::new(crate::external::SearchPath::from_env());
        let tools = ToolPaths { httpx: Some("definitely-not-httpx-9c1d".into()), ..Default::default() };
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("never");
        let report = HostProber::new(&runner, &tools, 5, 30).probe("example.com", &[], ProbeMode::Full, &out).await;
        assert!(report.live_urls.is_empty());
        assert!(!out.exists());
    }
}
