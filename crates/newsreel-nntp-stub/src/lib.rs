use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

type StubResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const OVERVIEW_FMT: &[&str] = &[
    "Subject:",
    "From:",
    "Date:",
    "Message-ID:",
    "References:",
    ":bytes",
    ":lines",
    "Xref:full",
];

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureConfig {
    pub greeting: Option<String>,
    pub groups: HashMap<String, GroupConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupConfig {
    pub articles: Vec<ArticleFixture>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArticleFixture {
    pub number: u64,
    pub message_id: String,
    pub headers: Vec<String>,
    pub body: String,
}

impl ArticleFixture {
    fn header(&self, name: &str) -> &str {
        self.headers
            .iter()
            .find_map(|h| {
                let (key, value) = h.split_once(':')?;
                key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
            })
            .unwrap_or("")
    }

    fn body_lines(&self) -> Vec<&str> {
        self.body.split('\n').map(|l| l.trim_end_matches('\r')).collect()
    }

    fn overview_line(&self, group: &str) -> String {
        let lines = self.body_lines();
        let bytes: usize = lines.iter().map(|l| l.len() + 2).sum();
        [
            self.number.to_string(),
            self.header("Subject").to_string(),
            self.header("From").to_string(),
            self.header("Date").to_string(),
            self.message_id.clone(),
            self.header("References").to_string(),
            bytes.to_string(),
            lines.len().to_string(),
            format!("Xref: stub {group}:{}", self.number),
        ]
        .join("\t")
    }
}

#[derive(Debug, Clone)]
pub struct StubConfig {
    pub bind: SocketAddr,
    pub require_auth: bool,
    pub username: String,
    pub password: String,
    pub disconnect_after: usize,
    pub delay_ms: u64,
}

#[derive(Debug)]
struct SessionState {
    authenticated: bool,
    user_accepted: bool,
    current_group: Option<String>,
    commands_seen: usize,
}

#[derive(Clone)]
pub struct StubServer {
    state: Arc<ServerState>,
}

impl StubServer {
    pub fn new(config: StubConfig, fixtures: FixtureConfig) -> Self {
        Self {
            state: Arc::new(ServerState { config, fixtures }),
        }
    }

    pub async fn serve(self) -> StubResult<()> {
        let listener = TcpListener::bind(self.state.config.bind).await?;
        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!("client connected from {peer}");
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = handle_client(stream, state).await {
                    tracing::warn!("client error: {err}");
                }
            });
        }
    }

    pub async fn serve_once(self) -> StubResult<()> {
        let listener = TcpListener::bind(self.state.config.bind).await?;
        let (stream, _) = listener.accept().await?;
        handle_client(stream, Arc::clone(&self.state)).await
    }
}

struct ServerState {
    config: StubConfig,
    fixtures: FixtureConfig,
}

impl ServerState {
    fn group(&self, session: &SessionState) -> Option<(&str, &GroupConfig)> {
        let name = session.current_group.as_deref()?;
        self.fixtures
            .groups
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Looks an article up by `<message-id>` in any group, or by number in
    /// the selected group.
    fn find_article(&self, session: &SessionState, id: &str) -> Option<&ArticleFixture> {
        if id.starts_with('<') {
            return self
                .fixtures
                .groups
                .values()
                .flat_map(|g| g.articles.iter())
                .find(|a| a.message_id == id);
        }
        let number: u64 = id.parse().ok()?;
        let (_, group) = self.group(session)?;
        group.articles.iter().find(|a| a.number == number)
    }
}

pub fn load_fixtures(path: &Path) -> StubResult<FixtureConfig> {
    let data = std::fs::read_to_string(path)?;
    let fixtures = serde_json::from_str(&data)?;
    Ok(fixtures)
}

async fn handle_client(stream: TcpStream, state: Arc<ServerState>) -> StubResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let greeting = state
        .fixtures
        .greeting
        .clone()
        .unwrap_or_else(|| "200 newsreel test server ready".to_string());
    writer
        .write_all(format!("{greeting}\r\n").as_bytes())
        .await?;

    let mut session = SessionState {
        authenticated: !state.config.require_auth,
        user_accepted: false,
        current_group: None,
        commands_seen: 0,
    };

    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            break;
        }

        let command_line = line.trim();
        if command_line.is_empty() {
            continue;
        }

        session.commands_seen += 1;
        maybe_delay(&state.config).await;
        if should_disconnect(&state.config, &session) {
            return Ok(());
        }

        let mut parts = command_line.split_whitespace();
        let command = parts.next().unwrap_or("").to_uppercase();
        let argument = parts.next().unwrap_or("");

        if command == "QUIT" {
            writer.write_all(b"205 closing connection\r\n").await?;
            break;
        }
        if command == "AUTHINFO" {
            let value = parts.next().unwrap_or("");
            handle_authinfo(argument, value, &state, &mut session, &mut writer).await?;
            continue;
        }
        if !session.authenticated {
            writer.write_all(b"480 authentication required\r\n").await?;
            continue;
        }

        match command.as_str() {
            "GROUP" => handle_group(argument, &state, &mut session, &mut writer).await?,
            "ARTICLE" | "HEAD" | "STAT" => {
                handle_article(&command, argument, &state, &session, &mut writer).await?
            }
            "LIST" if argument.eq_ignore_ascii_case("OVERVIEW.FMT") => {
                writer.write_all(b"215 order of fields in overview database\r\n").await?;
                send_lines(OVERVIEW_FMT.iter().copied(), &mut writer).await?;
            }
            "XOVER" | "XZVER" => {
                handle_overview(&command, argument, &state, &session, &mut writer).await?
            }
            _ => {
                writer.write_all(b"500 command not recognized\r\n").await?;
            }
        }
    }

    Ok(())
}

async fn handle_authinfo<W: AsyncWrite + Unpin>(
    verb: &str,
    value: &str,
    state: &ServerState,
    session: &mut SessionState,
    writer: &mut W,
) -> StubResult<()> {
    if value.is_empty() {
        writer.write_all(b"501 syntax error\r\n").await?;
        return Ok(());
    }

    match verb.to_uppercase().as_str() {
        "USER" => {
            if value == state.config.username {
                session.user_accepted = true;
                writer.write_all(b"381 password required\r\n").await?;
            } else {
                writer.write_all(b"481 authentication rejected\r\n").await?;
            }
        }
        "PASS" => {
            if !session.user_accepted {
                writer
                    .write_all(b"482 authentication commands issued out of sequence\r\n")
                    .await?;
            } else if value == state.config.password {
                session.authenticated = true;
                writer.write_all(b"281 authentication accepted\r\n").await?;
            } else {
                writer.write_all(b"481 authentication rejected\r\n").await?;
            }
        }
        _ => {
            writer.write_all(b"501 syntax error\r\n").await?;
        }
    }

    Ok(())
}

async fn handle_group<W: AsyncWrite + Unpin>(
    group: &str,
    state: &ServerState,
    session: &mut SessionState,
    writer: &mut W,
) -> StubResult<()> {
    let Some(config) = state.fixtures.groups.get(group) else {
        writer.write_all(b"411 no such group\r\n").await?;
        return Ok(());
    };

    session.current_group = Some(group.to_string());
    let count = config.articles.len();
    let low = config.articles.iter().map(|a| a.number).min().unwrap_or(0);
    let high = config.articles.iter().map(|a| a.number).max().unwrap_or(0);
    writer
        .write_all(format!("211 {count} {low} {high} {group}\r\n").as_bytes())
        .await?;
    Ok(())
}

async fn handle_article<W: AsyncWrite + Unpin>(
    command: &str,
    id: &str,
    state: &ServerState,
    session: &SessionState,
    writer: &mut W,
) -> StubResult<()> {
    if !id.starts_with('<') && session.current_group.is_none() {
        writer.write_all(b"412 no newsgroup selected\r\n").await?;
        return Ok(());
    }

    let Some(article) = state.find_article(session, id) else {
        let reply: &[u8] = if id.starts_with('<') {
            b"430 no such article\r\n"
        } else {
            b"423 no article with that number\r\n"
        };
        writer.write_all(reply).await?;
        return Ok(());
    };

    let number = if id.starts_with('<') { 0 } else { article.number };
    let message_id = &article.message_id;
    match command {
        "ARTICLE" => {
            writer
                .write_all(format!("220 {number} {message_id}\r\n").as_bytes())
                .await?;
            let lines = article
                .headers
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(""))
                .chain(article.body_lines());
            send_lines(lines, writer).await?;
        }
        "HEAD" => {
            writer
                .write_all(format!("221 {number} {message_id}\r\n").as_bytes())
                .await?;
            send_lines(article.headers.iter().map(String::as_str), writer).await?;
        }
        _ => {
            writer
                .write_all(format!("223 {number} {message_id}\r\n").as_bytes())
                .await?;
        }
    }
    Ok(())
}

async fn handle_overview<W: AsyncWrite + Unpin>(
    command: &str,
    range: &str,
    state: &ServerState,
    session: &SessionState,
    writer: &mut W,
) -> StubResult<()> {
    let Some((name, group)) = state.group(session) else {
        writer.write_all(b"412 no newsgroup selected\r\n").await?;
        return Ok(());
    };
    let Some((low, high)) = parse_range(range) else {
        writer.write_all(b"501 syntax error\r\n").await?;
        return Ok(());
    };

    let lines: Vec<String> = group
        .articles
        .iter()
        .filter(|a| a.number >= low && a.number <= high)
        .map(|a| a.overview_line(name))
        .collect();
    if lines.is_empty() {
        writer.write_all(b"420 no articles in range\r\n").await?;
        return Ok(());
    }

    if command == "XZVER" {
        writer.write_all(b"224 compressed data follows\r\n").await?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&dot_stuffed(lines.iter().map(String::as_str)))?;
        writer.write_all(&encoder.finish()?).await?;
    } else {
        writer.write_all(b"224 overview information follows\r\n").await?;
        send_lines(lines.iter().map(String::as_str), writer).await?;
    }
    Ok(())
}

fn parse_range(range: &str) -> Option<(u64, u64)> {
    match range.split_once('-') {
        Some((low, "")) => Some((low.parse().ok()?, u64::MAX)),
        Some((low, high)) => Some((low.parse().ok()?, high.parse().ok()?)),
        None => {
            let n = range.parse().ok()?;
            Some((n, n))
        }
    }
}

fn dot_stuffed<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        if line.starts_with('.') {
            out.push(b'.');
        }
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

async fn send_lines<'a, W: AsyncWrite + Unpin>(
    lines: impl Iterator<Item = &'a str>,
    writer: &mut W,
) -> StubResult<()> {
    writer.write_all(&dot_stuffed(lines)).await?;
    Ok(())
}

async fn maybe_delay(config: &StubConfig) {
    if config.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
    }
}

fn should_disconnect(config: &StubConfig, session: &SessionState) -> bool {
    config.disconnect_after > 0 && session.commands_seen >= config.disconnect_after
}
