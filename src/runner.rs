use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;

use crate::cli::Cli;
use bounty_recon::config::{Config, DEFAULT_CONFIG_PATH};
use bounty_recon::external::{SearchPath, ToolRunner};
use bounty_recon::http_client::{create_api_client, API_TIMEOUT_SECS};
use bounty_recon::pipeline::{resolve_output_root, Pipeline, PipelinePlan, RunSettings};
use bounty_recon::targets::load_targets;
use bounty_recon::ReconError;

fn print_ascii_logo() {
    println!(r#"
  ____                    _           ____
 | __ )  ___  _   _ _ __ | |_ _   _  |  _ \ ___  ___ ___  _ __
 |  _ \ / _ \| | | | '_ \| __| | | | | |_) / _ \/ __/ _ \| '_ \
 | |_) | (_) | |_| | | | | |_| |_| | |  _ <  __/ (_| (_) | | | |
 |____/ \___/ \__,_|_| |_|\__|\__, | |_| \_\___|\___\___/|_| |_|
                              |___/      BugBounty Framework v0.1
    "#);
}

/// Console logging plus an ANSI-free copy in `<log_dir>/bugbounty_<ts>.log`.
fn init_logging(cli: &Cli, log_dir: &Path) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let crate_level = if cli.debug { "debug" } else { "info" };
    let filter_str = format!("bounty_recon={level},reqwest=info,hyper=info", level = crate_level);
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));

    let file_layer = match open_log_file(log_dir) {
        Ok(f) => Some(fmt::layer().with_writer(Mutex::new(f)).with_ansi(false)),
        Err(e) => {
            eprintln!("[!] Warning: log file disabled: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(true).with_target(false))
        .with(file_layer)
        .init();
}

fn open_log_file(log_dir: &Path) -> std::io::Result<std::fs::File> {
    bounty_recon::utils::ensure_dir(log_dir)?;
    let name = format!("bugbounty_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    std::fs::OpenOptions::new().create(true).append(true).open(log_dir.join(name))
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    print_ascii_logo();

    // Fatal checks run before any log file or output directory exists.
    let plan = PipelinePlan::from_flags(&cli.modules()).context(
        "select at least one scan module: --recon1, --recon2, --recon3, --subdomains, --urls or --all",
    )?;
    let targets = load_targets(cli.url.as_deref(), cli.list.as_deref(), plan.normalizes_targets())
        .with_context(|| match &cli.list {
            Some(p) => format!("cannot read target list {}", p.display()),
            None => "cannot load targets".to_string(),
        })?;
    let (config, fallback) = Config::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(p) => format!("cannot load config {}", p.display()),
        None => "cannot load config".to_string(),
    })?;

    init_logging(&cli, &config.recon.log_dir);
    match fallback {
        Some(ReconError::Config(reason)) => tracing::warn!("{}, using built-in defaults", reason),
        Some(e) => tracing::error!(path = DEFAULT_CONFIG_PATH, error = %e, "failed to load config, using built-in defaults"),
        None => {}
    }

    tracing::info!("starting BugBounty Framework");
    tracing::debug!(?cli, "arguments");
    tracing::info!("targets loaded: {}", targets.len());

    let settings = RunSettings {
        threads: cli.threads,
        timeout_secs: cli.timeout,
        user_agent: cli.user_agent.clone().unwrap_or_else(|| config.recon.user_agent.clone()),
    };
    if cli.verbose {
        println!("[~] Config:");
        println!("    URL:     {}", cli.url.as_deref().unwrap_or("-"));
        println!("    List:    {}", cli.list.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".into()));
        println!("    Threads: {}", settings.threads);
        println!("    Output:  {}", cli.output.as_deref().unwrap_or("-"));
        println!();
    }

    let search_path = SearchPath::from_env();
    tracing::debug!(path = ?search_path.as_os_str(), "tool search path");
    let client = create_api_client(&settings.user_agent, API_TIMEOUT_SECS)?;
    let output_root = resolve_output_root(&config, cli.output.as_deref());

    let pipeline = Pipeline::new(config, ToolRunner::new(search_path), client, settings, output_root);
    let summaries = pipeline.run(&targets, plan).await?;

    for s in &summaries {
        println!(
            "[+] {}: {} subdomains, {} live, {} hosts with URLs, {} failed sources",
            s.target,
            s.subdomains,
            s.live_hosts,
            s.url_hosts,
            s.failed_sources.len()
        );
    }
    println!("[+] Results in {}", pipeline.output_root().display());
    Ok(())
}
