//! Socket establishment: plain TCP or implicit TLS.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::{ClientConfig, RootCertStore, pki_types::ServerName};

use crate::error::NntpError;
use crate::model::{Encryption, NewsServer};

pub trait NntpIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> NntpIo for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub async fn open(server: &NewsServer) -> Result<Box<dyn NntpIo>, NntpError> {
    let tcp = TcpStream::connect((server.host.as_str(), server.port)).await?;
    tcp.set_nodelay(true)?;
    tracing::debug!("connected to {}:{}", server.host, server.port);

    match server.encryption {
        Encryption::None => Ok(Box::new(tcp)),
        Encryption::Tls => {
            let config = build_tls_config()?;
            let tls = tls_connect(tcp, &server.host, config).await?;
            Ok(Box::new(tls))
        }
    }
}

/// Build a TLS [`ClientConfig`] trusting the webpki root set.
///
/// The ring provider is passed explicitly so no process-wide default
/// provider has to be installed.
pub fn build_tls_config() -> Result<Arc<ClientConfig>, NntpError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| NntpError::Tls(e.to_string()))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

async fn tls_connect(
    tcp: TcpStream,
    hostname: &str,
    tls_config: Arc<ClientConfig>,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>, NntpError> {
    let connector = TlsConnector::from(tls_config);
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| NntpError::Tls(format!("invalid hostname: {hostname}")))?;

    connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| NntpError::Tls(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_config_builds() {
        let config = build_tls_config().unwrap();
        assert!(Arc::strong_count(&config) >= 1);
    }

    #[tokio::test]
    async fn open_plain_connects_to_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = NewsServer {
            id: 1,
            name: "local".into(),
            host: "127.0.0.1".into(),
            port,
            username: None,
            password: None,
            encryption: Encryption::None,
            timeout: 5,
        };
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });
        assert!(open(&server).await.is_ok());
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn open_refused_is_io_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let server = NewsServer {
            id: 1,
            name: "gone".into(),
            host: "127.0.0.1".into(),
            port,
            username: None,
            password: None,
            encryption: Encryption::None,
            timeout: 5,
        };
        assert!(matches!(open(&server).await, Err(NntpError::Io(_))));
    }
}
