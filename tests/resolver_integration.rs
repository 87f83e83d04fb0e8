//! Integration tests for link resolution over real HTTP page loads and existence checks.

mod support;
use support::socket_guard::start_mock_server_or_skip;

use std::sync::Arc;
use std::time::Duration;

use acmdl_core::{
    ArticleReference, DownloadResult, HttpClient, HttpPageSource, HttpSettings, LinkResolver,
    Resolution, Resolve, ResolvedLink, RetryPolicy, SkipReason,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver() -> LinkResolver {
    let pages = Arc::new(HttpPageSource::with_timeout(Duration::from_secs(5)).unwrap());
    let settings = HttpSettings {
        head_timeout: Duration::from_secs(5),
        ..HttpSettings::default()
    };
    let client = HttpClient::new(settings, RetryPolicy::with_max_attempts(1)).unwrap();
    LinkResolver::new(pages, client, Duration::from_secs(5))
}

async fn serve_html(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_open_access_page_resolves_to_checked_pdf() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_html(
        &server,
        "/doi/10.1145/1",
        support::open_access_article("Null Safety in Practice", "/doi/pdf/10.1145/1"),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/doi/pdf/10.1145/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/10.1145/1", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    assert_eq!(
        resolution,
        Resolution::Link(ResolvedLink {
            pdf_url: format!("{}/doi/pdf/10.1145/1", server.uri()),
            title: Some("Null Safety in Practice".to_string()),
        })
    );
}

#[tokio::test]
async fn test_restricted_page_is_skipped_even_with_pdf_anchor() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_html(
        &server,
        "/doi/10.1145/2",
        r#"<html><body>
        <h1>Paywalled</h1>
        <i aria-label="Restricted Access"></i>
        <a href="/doi/pdf/10.1145/2">PDF</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/10.1145/2", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    assert_eq!(
        resolution,
        Resolution::Verdict(DownloadResult::skipped(SkipReason::NotOpenAccess))
    );
}

#[tokio::test]
async fn test_read_online_link_used_when_no_pdf_anchor() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_html(
        &server,
        "/doi/10.1145/3",
        r#"<html><body>
        <h1>Reader Only</h1>
        <span class="access__label">Free Access</span>
        <a href="/doi/epdf/10.1145/3">Read Online</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/doi/epdf/10.1145/3"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/10.1145/3", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    match resolution {
        Resolution::Link(link) => {
            assert_eq!(link.pdf_url, format!("{}/doi/epdf/10.1145/3", server.uri()));
            assert_eq!(link.title.as_deref(), Some("Reader Only"));
        }
        other => panic!("expected a link, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_existence_check_is_inaccessible() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_html(
        &server,
        "/doi/10.1145/4",
        support::open_access_article("Forbidden", "/doi/pdf/10.1145/4"),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/doi/pdf/10.1145/4"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/10.1145/4", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    assert_eq!(
        resolution,
        Resolution::Verdict(DownloadResult::skipped(SkipReason::Inaccessible(
            "403".to_string()
        )))
    );
}

#[tokio::test]
async fn test_missing_article_page_is_skipped() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/10.1145/5", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    assert!(
        matches!(
            resolution,
            Resolution::Verdict(DownloadResult::Skipped {
                reason: SkipReason::PageUnavailable(_)
            })
        ),
        "got {resolution:?}"
    );
}

#[tokio::test]
async fn test_direct_pdf_reference_is_checked_without_page_load() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .and(path("/doi/pdf/10.1145/6"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let pdf_url = format!("{}/doi/pdf/10.1145/6", server.uri());
    let reference = ArticleReference::new(pdf_url.clone()).with_title("Direct");
    let resolution = resolver().resolve(&reference).await;

    assert_eq!(
        resolution,
        Resolution::Link(ResolvedLink {
            pdf_url,
            title: Some("Direct".to_string()),
        })
    );
}

#[tokio::test]
async fn test_forbidden_direct_pdf_reference_is_inaccessible() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .and(path("/doi/pdf/10.1145/300"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(0)
        .mount(&server)
        .await;

    let reference = ArticleReference::new(format!("{}/doi/pdf/10.1145/300", server.uri()));
    let resolution = resolver().resolve(&reference).await;

    assert_eq!(
        resolution,
        Resolution::Verdict(DownloadResult::skipped(SkipReason::Inaccessible(
            "403".to_string()
        )))
    );
}
