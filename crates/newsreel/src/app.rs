use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use newsreel_config::{Config, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, DEFAULT_TLS_PORT};
use newsreel_nntp::{Encryption, NewsServer, NntpSession};

use crate::cli::{Cli, Command};

pub fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("loading config: {}", path.display()))
}

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Filter for `--log-level`; an unparseable level falls back to `warn`.
pub fn log_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(log_level))
        .with_writer(std::io::stderr)
        .init();
}

/// Picks the server numbered `--server` from `config` and applies the
/// command-line overrides. Without a matching entry, `--host` is required.
pub fn resolve_server(cli: &Cli, config: Option<&Config>) -> Result<NewsServer> {
    let mut server = match config.and_then(|c| c.server(cli.server)) {
        Some(server) => server.clone(),
        None => {
            let host = cli.host.clone().with_context(|| {
                format!(
                    "server {} is not configured; pass --host or --config",
                    cli.server
                )
            })?;
            NewsServer {
                id: cli.server,
                name: host.clone(),
                host,
                port: DEFAULT_PORT,
                username: None,
                password: None,
                encryption: Encryption::None,
                timeout: DEFAULT_TIMEOUT_SECS,
            }
        }
    };

    if let Some(host) = &cli.host {
        server.host = host.clone();
    }
    if cli.tls && server.encryption == Encryption::None {
        server.encryption = Encryption::Tls;
        if server.port == DEFAULT_PORT {
            server.port = DEFAULT_TLS_PORT;
        }
    }
    if let Some(port) = cli.port {
        server.port = port;
    }
    if let Some(user) = &cli.user {
        server.username = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        server.password = Some(password.clone());
    }
    Ok(server)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Some(load_config(&path)?),
        None => None,
    };
    let server = resolve_server(&cli, config.as_ref())?;
    tracing::info!("using server {} ({}:{})", server.name, server.host, server.port);

    let output = fetch(&server, &cli.command).await?;
    print!("{output}");
    Ok(())
}

/// Connects, authenticates when a username is configured, runs `command` and
/// disconnects, all within the server's timeout.
pub async fn fetch(server: &NewsServer, command: &Command) -> Result<String> {
    let limit = Duration::from_secs(server.timeout);
    tokio::time::timeout(limit, async {
        let mut session = NntpSession::connect(server)
            .await
            .with_context(|| format!("connecting to {}:{}", server.host, server.port))?;
        if let Some(username) = &server.username {
            session
                .authenticate(username, server.password.as_deref())
                .await
                .with_context(|| format!("authenticating as {username}"))?;
        }

        let result = execute(&mut session, command).await;
        if let Err(err) = session.disconnect().await {
            tracing::debug!("disconnect failed: {err}");
        }
        result
    })
    .await
    .with_context(|| format!("{} gave no answer within {}s", server.name, server.timeout))?
}

pub async fn execute(session: &mut NntpSession, command: &Command) -> Result<String> {
    let mut out = String::new();
    match command {
        Command::Group { name } => {
            let info = session.group(name).await?;
            writeln!(out, "{} {} {} {}", info.name, info.count, info.first, info.last)?;
        }
        Command::Article { id } => {
            let article = session.article(id).await?;
            for line in &article.headers {
                writeln!(out, "{line}")?;
            }
            writeln!(out)?;
            for line in &article.body {
                writeln!(out, "{line}")?;
            }
        }
        Command::Head { id } => {
            let head = session.head(id).await?;
            for line in &head.headers {
                writeln!(out, "{line}")?;
            }
        }
        Command::Stat { id } => {
            let stat = session.stat(id).await?;
            writeln!(out, "{} {}", stat.number, stat.message_id)?;
        }
        Command::OverviewFormat => {
            let format = session.overview_format().await?;
            for field in format.fields() {
                let suffix = if field.full { ":full" } else { "" };
                writeln!(out, "{}{suffix}", field.name)?;
            }
        }
        Command::Overview {
            range,
            group,
            compressed,
        } => {
            if let Some(group) = group {
                session.group(group).await?;
            }
            let format = session.overview_format().await?.numbered();
            let rows = if *compressed {
                session.overview_compressed(range, &format).await?
            } else {
                session.overview(range, &format).await?
            };
            tracing::info!("{} overview rows for {range}", rows.len());
            for row in &rows {
                let values: Vec<&str> = row.iter().map(|(_, value)| value).collect();
                writeln!(out, "{}", values.join("\t"))?;
            }
        }
    }
    Ok(out)
}
