use clap::Parser;
use std::path::PathBuf;

use bounty_recon::pipeline::ModuleFlags;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Bug bounty reconnaissance orchestrator", long_about = None)]
#[command(group(clap::ArgGroup::new("targets").required(true).multiple(true).args(["url", "list"])))]
#[command(after_help = "Examples:\n  bounty-recon -l domains.txt --recon1 -o acme\n  bounty-recon -u https://example.com --all -v -t 10")]
pub struct Cli {
    /// Single target domain or URL
    #[arg(short = 'u', long, help_heading = "Targets")]
    pub url: Option<String>,

    /// File with newline-delimited domains or URLs
    #[arg(short = 'l', long, help_heading = "Targets")]
    pub list: Option<PathBuf>,

    /// Passive recon + light probing (4 common ports)
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub recon1: bool,

    /// Passive recon + full probing (extended port list)
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub recon2: bool,

    /// Passive recon + fast probing (live URLs only)
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub recon3: bool,

    /// Passive subdomain discovery only
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub subdomains: bool,

    /// URL extraction and classification (alone: run directly on the input list)
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub urls: bool,

    /// Everything: recon + full probing + URLs
    #[arg(long, default_value_t = false, help_heading = "Scan Modules")]
    pub all: bool,

    /// httpx thread count
    #[arg(short = 't', long, default_value_t = 5_usize)]
    pub threads: usize,

    /// Output directory name, created under the configured output root
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// httpx per-request timeout in seconds
    #[arg(long, default_value_t = 30_u64)]
    pub timeout: u64,

    /// Custom User-Agent for API queries
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Config file (default: configs/default.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    pub fn modules(&self) -> ModuleFlags {
        ModuleFlags {
            recon1: self.recon1,
            recon2: self.recon2,
            recon3: self.recon3,
            subdomains: self.subdomains,
            urls: self.urls,
            all: self.all,
        }
    }
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modules_and_defaults() {
        let cli = Cli::try_parse_from(["bounty-recon", "-u", "example.com", "--recon2", "--urls"]).unwrap();
        assert_eq!(cli.threads, 5);
        assert_eq!(cli.timeout, 30);
        let m = cli.modules();
        assert!(m.recon2 && m.urls && !m.all);
    }

    #[test]
    fn a_target_is_required() {
        assert!(Cli::try_parse_from(["bounty-recon", "--recon1"]).is_err());
    }
}
