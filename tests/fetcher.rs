//! Fetcher tests against a local HTTP server

use std::time::Duration;

use adishe::error::AdisheError;
use adishe::fetcher::{BlocklistSource, Fetcher, CUSTOM_SECTION_END};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(status: u16, body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hosts"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn fetcher(server: &MockServer) -> Fetcher {
    Fetcher::new(format!("{}/hosts", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_parses_hosts_body() {
    let body = format!(
        "# Title: gambling\n\
         0.0.0.0 custom.example\n\
         {}\n\
         0.0.0.0 Casino.Example\n\
         127.0.0.1 poker.example bet.example # two names\n\
         10.0.0.5 redirect.example\n",
        CUSTOM_SECTION_END
    );
    let server = serve(200, body).await;

    let hosts = fetcher(&server).fetch().await.unwrap();
    let hosts: Vec<&str> = hosts.iter().map(String::as_str).collect();
    assert_eq!(hosts, vec!["bet.example", "casino.example", "poker.example"]);
}

#[tokio::test]
async fn test_fetch_without_marker_is_empty() {
    let server = serve(200, "0.0.0.0 casino.example\n".to_string()).await;
    let hosts = fetcher(&server).fetch().await.unwrap();
    assert!(hosts.is_empty());
}

#[tokio::test]
async fn test_fetch_http_error() {
    let server = serve(500, String::new()).await;
    let err = fetcher(&server).fetch().await.unwrap_err();
    match err {
        AdisheError::Fetch { reason, .. } => assert!(reason.contains("500")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_rejects_oversized_body() {
    let body = "#".repeat(10 * 1024 * 1024 + 1);
    let server = serve(200, body).await;
    let err = fetcher(&server).fetch().await.unwrap_err();
    match err {
        AdisheError::Fetch { reason, .. } => assert!(reason.contains("too large")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_unreachable_server() {
    let fetcher = Fetcher::new("http://127.0.0.1:1/hosts", Duration::from_secs(2)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, AdisheError::Fetch { .. }));
}
