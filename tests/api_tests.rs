use bounty_recon::discover::{crtsh, urlscan};
use bounty_recon::http_client::create_api_client;
use bounty_recon::ReconError;
use serde_json::json;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn crtsh_sends_agent_and_filters_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", "%.example.com"))
        .and(query_param("output", "json"))
        .and(header("user-agent", "ReconTest/1.0"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name_value": "a.example.com\nb.example.com"},
            {"name_value": "unrelated.org"}
        ])))
        .mount(&server)
        .await;

    let client = create_api_client("ReconTest/1.0", 10).unwrap();
    let base = format!("{}/", server.uri());
    let names = crtsh::crtsh_subdomains(&client, &base, "example.com").await.unwrap();
    assert_eq!(names, vec!["a.example.com", "b.example.com"]);
}

#[tokio::test]
async fn crtsh_html_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let client = create_api_client("ReconTest/1.0", 10).unwrap();
    let res = crtsh::crtsh_subdomains(&client, &format!("{}/", server.uri()), "example.com").await;
    assert!(matches!(res, Err(ReconError::Parse { .. })));
}

#[tokio::test]
async fn urlscan_non_2xx_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = create_api_client("ReconTest/1.0", 10).unwrap();
    let base = format!("{}/api/v1/search/", server.uri());
    let res = urlscan::urlscan_subdomains(&client, &base, "example.com").await;
    assert!(matches!(res, Err(ReconError::Network { .. })));
}

#[tokio::test]
async fn urlscan_reads_nested_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .and(query_param("q", "domain:example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"task": {"domain": "www.example.com"}, "page": {"domain": "www.example.com", "server": "cloudflare"}},
                {"task": {"host": "api.example.com"}}
            ]
        })))
        .mount(&server)
        .await;

    let client = create_api_client("ReconTest/1.0", 10).unwrap();
    let base = format!("{}/api/v1/search/", server.uri());
    let hosts = urlscan::urlscan_subdomains(&client, &base, "example.com").await.unwrap();
    assert_eq!(hosts, vec!["api.example.com", "www.example.com"]);
}
