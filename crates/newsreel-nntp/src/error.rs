use thiserror::Error;

#[derive(Debug, Error)]
pub enum NntpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Decompression error: {0}")]
    Decompress(String),

    #[error("Unexpected response {0}: {1}")]
    UnexpectedResponse(u16, String),

    #[error("Another command is still awaiting its response")]
    OperationPending,

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("No such group: {0}")]
    NoSuchGroup(String),

    #[error("No newsgroup selected")]
    NoGroupSelected,

    #[error("Authentication required")]
    AuthRequired,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Server requested a password but none is configured")]
    PasswordRequired,
}

/// Coarse classification of [`NntpError`] so callers can branch on named
/// protocol conditions separately from generic violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    Protocol,
    Domain,
    Decompress,
}

impl NntpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NntpError::Io(_)
            | NntpError::Tls(_)
            | NntpError::ConnectionClosed
            | NntpError::NotConnected => ErrorKind::Transport,
            NntpError::Parse(_) => ErrorKind::Parse,
            NntpError::Decompress(_) => ErrorKind::Decompress,
            NntpError::UnexpectedResponse(..) | NntpError::OperationPending => {
                ErrorKind::Protocol
            }
            NntpError::ArticleNotFound(_)
            | NntpError::NoSuchGroup(_)
            | NntpError::NoGroupSelected
            | NntpError::AuthRequired
            | NntpError::AuthFailed(_)
            | NntpError::PasswordRequired => ErrorKind::Domain,
        }
    }

    /// True when the framing state of the connection can no longer be trusted.
    pub fn desynchronizes(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Decompress | ErrorKind::Transport
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_are_not_protocol_errors() {
        assert_eq!(
            NntpError::ArticleNotFound("<a@b>".into()).kind(),
            ErrorKind::Domain
        );
        assert_eq!(
            NntpError::UnexpectedResponse(500, "what?".into()).kind(),
            ErrorKind::Protocol
        );
    }

    #[test]
    fn parse_failures_desynchronize() {
        assert!(NntpError::Parse("bad".into()).desynchronizes());
        assert!(NntpError::Decompress("bad".into()).desynchronizes());
        assert!(!NntpError::NoSuchGroup("alt.test".into()).desynchronizes());
    }

    #[test]
    fn io_errors_convert() {
        let err: NntpError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("boom"));
    }
}
