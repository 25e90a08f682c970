use anyhow::Result;
use clap::Parser;

use newsreel::app;
use newsreel::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::init_tracing(&cli.log_level);
    app::run(cli).await
}
