use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use newsreel::app::fetch;
use newsreel::cli::Command;
use newsreel_nntp::{Encryption, NewsServer};
use newsreel_nntp_stub::{StubConfig, StubServer, load_fixtures};
use tokio::task::JoinHandle;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("nntp")
        .join("fixtures-basic.json")
}

fn available_port() -> u16 {
    let socket = std::net::TcpListener::bind("127.0.0.1:0").expect("bind port");
    socket.local_addr().expect("local addr").port()
}

async fn start_stub(port: u16, require_auth: bool) -> JoinHandle<()> {
    let config = StubConfig {
        bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        require_auth,
        username: "test".to_string(),
        password: "secret".to_string(),
        disconnect_after: 0,
        delay_ms: 0,
    };
    let server = StubServer::new(config, load_fixtures(&fixtures_path()).expect("fixtures"));
    let handle = tokio::spawn(async move {
        let _ = server.serve_once().await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle
}

fn server(port: u16) -> NewsServer {
    NewsServer {
        id: 1,
        name: "stub".to_string(),
        host: "127.0.0.1".to_string(),
        port,
        username: None,
        password: None,
        encryption: Encryption::None,
        timeout: 2,
    }
}

#[tokio::test]
async fn prints_group_summary() {
    let port = available_port();
    let stub = start_stub(port, false).await;

    let output = fetch(
        &server(port),
        &Command::Group {
            name: "misc.test".to_string(),
        },
    )
    .await
    .expect("fetch");
    assert_eq!(output, "misc.test 3 1 3\n");

    stub.await.expect("stub task");
}

#[tokio::test]
async fn prints_article_after_authenticating() {
    let port = available_port();
    let stub = start_stub(port, true).await;

    let server = NewsServer {
        username: Some("test".to_string()),
        password: Some("secret".to_string()),
        ..server(port)
    };
    let output = fetch(
        &server,
        &Command::Article {
            id: "<second@test>".to_string(),
        },
    )
    .await
    .expect("fetch");
    assert!(output.starts_with("From: bob@example.com\n"));
    assert!(output.ends_with("\n\nA reply.\n"));

    stub.await.expect("stub task");
}

#[tokio::test]
async fn prints_compressed_overview_rows() {
    let port = available_port();
    let stub = start_stub(port, false).await;

    let output = fetch(
        &server(port),
        &Command::Overview {
            range: "2-3".to_string(),
            group: Some("misc.test".to_string()),
            compressed: true,
        },
    )
    .await
    .expect("fetch");
    let rows: Vec<&str> = output.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("2\tRe: First post\tbob@example.com\t"));
    assert!(rows[1].ends_with("\tstub misc.test:3"));

    stub.await.expect("stub task");
}

#[tokio::test]
async fn wrong_password_fails_with_context() {
    let port = available_port();
    let stub = start_stub(port, true).await;

    let server = NewsServer {
        username: Some("test".to_string()),
        password: Some("nope".to_string()),
        ..server(port)
    };
    let err = fetch(&server, &Command::OverviewFormat)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("authenticating as test"));

    stub.abort();
}
