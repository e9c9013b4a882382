use clap::Parser;
use rewind_app_server::Cli;
use rewind_app_server::run_main;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli).await
}
