use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsreel_nntp_stub::{StubConfig, StubServer, load_fixtures};

/// Serves the groups and articles of a JSON fixture file over NNTP, for
/// pointing `newsreel` at something local.
#[derive(Parser, Debug)]
#[command(name = "newsreel-nntp-stub", version)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:3119")]
    bind: SocketAddr,

    #[arg(long, default_value = "fixtures/nntp/fixtures-basic.json")]
    fixtures: PathBuf,

    /// Answer 480 until AUTHINFO USER/PASS succeeds
    #[arg(long)]
    require_auth: bool,

    #[arg(long, default_value = "test")]
    username: String,

    #[arg(long, default_value = "secret")]
    password: String,

    /// Drop the connection on the Nth command (0 keeps it open)
    #[arg(long, default_value_t = 0)]
    disconnect_after: usize,

    /// Pause before answering each command
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Exit after the first client disconnects
    #[arg(long)]
    once: bool,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let fixtures = load_fixtures(&args.fixtures)?;
    tracing::info!(
        "loaded {} groups from {}",
        fixtures.groups.len(),
        args.fixtures.display()
    );

    let server = StubServer::new(
        StubConfig {
            bind: args.bind,
            require_auth: args.require_auth,
            username: args.username,
            password: args.password,
            disconnect_after: args.disconnect_after,
            delay_ms: args.delay_ms,
        },
        fixtures,
    );
    tracing::info!("listening on {}", args.bind);
    if args.once {
        server.serve_once().await
    } else {
        server.serve().await
    }
}
