mod cli;
mod runner;

#[tokio::main]
async fn main() {
    let cli = cli::parse_cli();
    if let Err(err) = runner::run_from_cli(cli).await {
        eprintln!("[-] Error: {:#}", err);
        std::process::exit(1);
    }
}
