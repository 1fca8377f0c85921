use std::path::Path;

use crate::config::ToolPaths;
use crate::error::ReconResult;
use crate::external::runner::ToolCommand;

pub const PORTS_LIGHT: &str = "80,443,8080,8443";
pub const PORTS_FULL: &str = "80,81,443,3000,8000,8008,8080,8081,8088,8443,8888,9000,9090";

pub fn subdominator(tools: &ToolPaths, domain: &str) -> ReconResult<ToolCommand> {
    Ok(ToolCommand::from_prefix(tools.subdominator()?)?.args(["-d", domain]))
}

/// subfinder writes its results to `out_file` rather than stdout.
pub fn subfinder(tools: &ToolPaths, domain: &str, out_file: &Path) -> ReconResult<ToolCommand> {
    Ok(ToolCommand::from_prefix(tools.subfinder())?
        .args(["-d", domain, "-all", "-o"])
        .arg(out_file.display().to_string()))
}

pub fn amass(tools: &ToolPaths, domain: &str) -> ReconResult<ToolCommand> {
    Ok(ToolCommand::from_prefix(tools.amass())?.args(["enum", "-passive", "-d", domain]))
}

/// httpx over a list file. `ports` of `None` asks for plain live-URL output,
/// otherwise JSON lines with content extraction over the given ports.
pub fn httpx(
    tools: &ToolPaths,
    list_file: &Path,
    threads: usize,
    timeout_secs: u64,
    ports: Option<&str>,
) -> ReconResult<ToolCommand> {
    let cmd = ToolCommand::from_prefix(tools.httpx())?
        .arg("-l")
        .arg(list_file.display().to_string())
        .args(["-threads".to_string(), threads.to_string()])
        .args(["-timeout".to_string(), timeout_secs.to_string()])
        .arg("-silent");
    Ok(match ports {
        None => cmd.arg("-no-color"),
        Some(ports) => cmd.args([
            "-json", "-probe", "-tech-detect", "-title", "-content-length", "-cdn", "-cname",
            "-ports", ports, "-retries", "1",
        ]),
    })
}

/// gau reads the host from stdin.
pub fn gau(tools: &ToolPaths, host: &str) -> ReconResult<ToolCommand> {
    Ok(ToolCommand::from_prefix(tools.gau())?.stdin(host))
}

pub fn katana(tools: &ToolPaths, host: &str) -> ReconResult<ToolCommand> {
    Ok(ToolCommand::from_prefix(tools.katana())?.args(["-u", host, "-silent", "-d", "2"]))
}
