//! NNTP session controller.
//!
//! Owns the socket and drives one command at a time through a freshly
//! assembled [`ResponsePipeline`], following the half-duplex request/response
//! discipline of [RFC 3977 §3.1](https://datatracker.ietf.org/doc/html/rfc3977#section-3.1).

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::NntpError;
use crate::model::{
    Article, ArticleHead, ArticleStat, ConnectionState, GroupInfo, NewsServer, OverviewFormat,
    OverviewRow, Response,
};
use crate::pipeline::{ResponsePipeline, ResponseShape};
use crate::reply;
use crate::transport::{self, NntpIo};

const READ_BUF_SIZE: usize = 16 * 1024;

/// The single in-flight command on a connection.
#[derive(Debug)]
struct PendingOperation {
    verb: String,
    pipeline: ResponsePipeline,
}

pub struct NntpSession {
    stream: Option<Box<dyn NntpIo>>,
    state: ConnectionState,
    pending: Option<PendingOperation>,
    read_buf: Vec<u8>,
}

impl NntpSession {
    /// Open a connection to `server` and consume its greeting
    /// ([RFC 3977 §5.1](https://datatracker.ietf.org/doc/html/rfc3977#section-5.1)).
    pub async fn connect(server: &NewsServer) -> Result<Self, NntpError> {
        let stream = transport::open(server).await?;
        Self::from_boxed(stream).await
    }

    /// Take over an already-established stream and consume its greeting.
    pub async fn from_stream<S: NntpIo + 'static>(stream: S) -> Result<Self, NntpError> {
        Self::from_boxed(Box::new(stream)).await
    }

    async fn from_boxed(stream: Box<dyn NntpIo>) -> Result<Self, NntpError> {
        let mut session = NntpSession {
            stream: Some(stream),
            state: ConnectionState::Disconnected,
            pending: None,
            read_buf: vec![0u8; READ_BUF_SIZE],
        };
        let greeting = session.run(None, ResponseShape::SingleLine).await?;
        match greeting.status {
            200 | 201 => {
                tracing::info!("server ready: {}", greeting.message);
                session.state = ConnectionState::Connected;
                Ok(session)
            }
            status => Err(NntpError::UnexpectedResponse(status, greeting.message)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn has_pending_operation(&self) -> bool {
        self.pending.is_some()
    }

    /// Authenticate with AUTHINFO USER/PASS ([RFC 4643 §2.3](https://datatracker.ietf.org/doc/html/rfc4643#section-2.3)).
    ///
    /// The password is only sent when the server asks for it with 381; an
    /// absent or empty password at that point fails without sending anything.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: Option<&str>,
    ) -> Result<(), NntpError> {
        let response = self
            .command(&format!("AUTHINFO USER {username}"), ResponseShape::SingleLine)
            .await?;
        let response = match response.status {
            281 => response,
            381 => {
                let password = password
                    .filter(|p| !p.is_empty())
                    .ok_or(NntpError::PasswordRequired)?;
                self.command(&format!("AUTHINFO PASS {password}"), ResponseShape::SingleLine)
                    .await?
            }
            _ => return Err(NntpError::AuthFailed(response.message)),
        };
        if response.status != 281 {
            return Err(NntpError::AuthFailed(response.message));
        }
        tracing::info!("authenticated as {username}");
        self.state = ConnectionState::Authenticated;
        Ok(())
    }

    /// Retrieve a whole article ([RFC 3977 §6.2.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.2.1)).
    pub async fn article(&mut self, id: &str) -> Result<Article, NntpError> {
        let response = self
            .command(&format!("ARTICLE {id}"), ResponseShape::MultiLine)
            .await?;
        let response = expect_article(response, 220, id)?;
        let (number, message_id) = reply::parse_article_ref(&response.message)?;
        let (headers, body) = reply::split_article(response.into_lines());
        Ok(Article {
            number,
            message_id,
            headers,
            body,
        })
    }

    /// Retrieve the headers of an article ([RFC 3977 §6.2.2](https://datatracker.ietf.org/doc/html/rfc3977#section-6.2.2)).
    pub async fn head(&mut self, id: &str) -> Result<ArticleHead, NntpError> {
        let response = self
            .command(&format!("HEAD {id}"), ResponseShape::MultiLine)
            .await?;
        let response = expect_article(response, 221, id)?;
        let (number, message_id) = reply::parse_article_ref(&response.message)?;
        Ok(ArticleHead {
            number,
            message_id,
            headers: response.into_lines(),
        })
    }

    /// Check article existence ([RFC 3977 §6.2.4](https://datatracker.ietf.org/doc/html/rfc3977#section-6.2.4)).
    pub async fn stat(&mut self, id: &str) -> Result<ArticleStat, NntpError> {
        let response = self
            .command(&format!("STAT {id}"), ResponseShape::SingleLine)
            .await?;
        let response = expect_article(response, 223, id)?;
        let (number, message_id) = reply::parse_article_ref(&response.message)?;
        Ok(ArticleStat { number, message_id })
    }

    /// Select a newsgroup ([RFC 3977 §6.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.1.1)).
    pub async fn group(&mut self, name: &str) -> Result<GroupInfo, NntpError> {
        let response = self
            .command(&format!("GROUP {name}"), ResponseShape::SingleLine)
            .await?;
        match response.status {
            211 => reply::parse_group(&response.message),
            411 => Err(NntpError::NoSuchGroup(name.to_string())),
            480 => Err(NntpError::AuthRequired),
            status => Err(NntpError::UnexpectedResponse(status, response.message)),
        }
    }

    /// Fetch the server's overview field list ([RFC 3977 §8.4](https://datatracker.ietf.org/doc/html/rfc3977#section-8.4)).
    ///
    /// The list omits the article number that leads every XOVER/XZVER line.
    /// Pass [`OverviewFormat::numbered`] of the result to [`overview`](Self::overview)
    /// when the server sends RFC 3977 lines.
    pub async fn overview_format(&mut self) -> Result<OverviewFormat, NntpError> {
        let response = self
            .command("LIST OVERVIEW.FMT", ResponseShape::MultiLine)
            .await?;
        match response.status {
            215 => Ok(reply::parse_overview_format(&response.into_lines())),
            480 => Err(NntpError::AuthRequired),
            status => Err(NntpError::UnexpectedResponse(status, response.message)),
        }
    }

    /// Fetch overview data for `range` with XOVER.
    ///
    /// Tab-separated tokens map onto `format` in order, starting with the
    /// first token of the line. For servers that lead each line with the
    /// article number, `format` must account for it (see
    /// [`OverviewFormat::numbered`]), otherwise every field shifts by one.
    pub async fn overview(
        &mut self,
        range: &str,
        format: &OverviewFormat,
    ) -> Result<Vec<OverviewRow>, NntpError> {
        let response = self
            .command(&format!("XOVER {range}"), ResponseShape::MultiLine)
            .await?;
        overview_rows(response, format)
    }

    /// Fetch overview data for `range` with XZVER; the body arrives
    /// zlib-compressed and is inflated before framing. Rows map onto `format`
    /// exactly as in [`overview`](Self::overview).
    pub async fn overview_compressed(
        &mut self,
        range: &str,
        format: &OverviewFormat,
    ) -> Result<Vec<OverviewRow>, NntpError> {
        let response = self
            .command(&format!("XZVER {range}"), ResponseShape::CompressedMultiLine)
            .await?;
        overview_rows(response, format)
    }

    /// Close the socket. Any outstanding operation is abandoned.
    pub async fn disconnect(&mut self) -> Result<(), NntpError> {
        if let Some(pending) = self.pending.take() {
            tracing::warn!("disconnecting with {} still outstanding", pending.verb);
        }
        self.state = ConnectionState::Disconnected;
        match self.stream.take() {
            Some(mut stream) => {
                stream.shutdown().await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn command(
        &mut self,
        command: &str,
        shape: ResponseShape,
    ) -> Result<Response, NntpError> {
        if self.state == ConnectionState::Disconnected {
            return Err(NntpError::NotConnected);
        }
        self.run(Some(command), shape).await
    }

    /// One request/response cycle: register the pending operation, write the
    /// command, await the response, then tear the operation down whatever the
    /// outcome. A future dropped mid-flight leaves the operation registered,
    /// so later commands are rejected until [`disconnect`](Self::disconnect).
    async fn run(
        &mut self,
        command: Option<&str>,
        shape: ResponseShape,
    ) -> Result<Response, NntpError> {
        if self.pending.is_some() {
            return Err(NntpError::OperationPending);
        }
        let verb = command
            .and_then(|c| c.split_whitespace().next())
            .unwrap_or("greeting")
            .to_string();
        self.pending = Some(PendingOperation {
            verb,
            pipeline: ResponsePipeline::new(shape),
        });

        let result = self.exchange(command).await;
        self.finish(&result);
        result
    }

    async fn exchange(&mut self, command: Option<&str>) -> Result<Response, NntpError> {
        let NntpSession {
            stream,
            pending,
            read_buf,
            ..
        } = self;
        let stream = stream.as_mut().ok_or(NntpError::NotConnected)?;
        let pending = pending.as_mut().ok_or(NntpError::NotConnected)?;

        if let Some(command) = command {
            tracing::debug!("> {}", redact(command));
            stream.write_all(format!("{command}\r\n").as_bytes()).await?;
            stream.flush().await?;
        }

        loop {
            let n = stream.read(read_buf.as_mut_slice()).await?;
            if n == 0 {
                return Err(NntpError::ConnectionClosed);
            }
            if let Some(response) = pending.pipeline.push(&read_buf[..n])? {
                return Ok(response);
            }
        }
    }

    fn finish(&mut self, result: &Result<Response, NntpError>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if let Err(err) = result {
            if err.desynchronizes() {
                tracing::warn!(
                    "{} failed, connection framing is no longer reliable: {err}",
                    pending.verb
                );
            } else {
                tracing::debug!("{} failed: {err}", pending.verb);
            }
        }
    }
}

fn expect_article(response: Response, expected: u16, id: &str) -> Result<Response, NntpError> {
    match response.status {
        status if status == expected => Ok(response),
        423 | 430 => Err(NntpError::ArticleNotFound(id.to_string())),
        480 => Err(NntpError::AuthRequired),
        status => Err(NntpError::UnexpectedResponse(status, response.message)),
    }
}

fn overview_rows(
    response: Response,
    format: &OverviewFormat,
) -> Result<Vec<OverviewRow>, NntpError> {
    match response.status {
        224 => Ok(response
            .into_lines()
            .iter()
            .map(|line| reply::parse_overview_line(line, format))
            .collect()),
        420 | 423 => Ok(Vec::new()),
        412 => Err(NntpError::NoGroupSelected),
        480 => Err(NntpError::AuthRequired),
        status => Err(NntpError::UnexpectedResponse(status, response.message)),
    }
}

fn redact(command: &str) -> &str {
    if command.starts_with("AUTHINFO PASS") {
        "AUTHINFO PASS ****"
    } else {
        command
    }
}
