use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use repo_insight::{config::AppConfig, create_app, AppState, ErrorResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(api_url: String) -> Router {
    let config = AppConfig {
        github_pat: Some("test-token".to_string()),
        github_api_url: api_url,
        ..AppConfig::default()
    };
    let state = Arc::new(AppState::new(config).expect("Failed to create state"));
    create_app(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body_bytes).unwrap())
}

/// Mounts a mock GitHub for `octo/demo` whose repository endpoint answers `repo_status`.
async fn mock_github(repo_status: u16) -> MockServer {
    let server = MockServer::start().await;

    let routes = [
        (
            "/repos/octo/demo",
            repo_status,
            json!({
                "name": "demo",
                "full_name": "octo/demo",
                "description": "A demo",
                "stargazers_count": 5,
                "forks_count": 2,
                "watchers_count": 5,
                "open_issues_count": 1,
                "language": "Rust",
                "created_at": "2020-01-01T00:00:00Z",
                "updated_at": "2024-02-01T00:00:00Z"
            }),
        ),
        (
            "/repos/octo/demo/commits",
            200,
            json!([
                {"commit": {"author": {"name": "B", "date": "2024-02-01T09:00:00Z"}, "message": "third"}},
                {"commit": {"author": {"name": "A", "date": "2024-01-20T09:00:00Z"}, "message": "second"}},
                {"commit": {"author": {"name": "A", "date": "2024-01-15T09:00:00Z"}, "message": "first"}}
            ]),
        ),
        (
            "/repos/octo/demo/contributors",
            200,
            json!([
                {"login": "a", "contributions": 3},
                {"login": "b", "contributions": 1}
            ]),
        ),
        (
            "/repos/octo/demo/languages",
            200,
            json!({"Rust": 900, "Shell": 100}),
        ),
        ("/repos/octo/demo/pulls", 200, json!([])),
        (
            "/repos/octo/demo/issues",
            200,
            json!([
                {"state": "open"},
                {"state": "open", "pull_request": {"url": "https://api.github.com/pulls/1"}},
                {"state": "closed"}
            ]),
        ),
    ];

    for (route, status, body) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
    }

    server
}

#[tokio::test]
async fn test_health_check() {
    let app = app_for("https://api.github.com".to_string());

    let (status, body_json) = get_json(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_json["status"], "ok");
    assert_eq!(body_json["service"], "repo-insight");
}

#[tokio::test]
async fn test_report_from_url() {
    let server = mock_github(200).await;
    let app = app_for(server.uri());

    let (status, report) = get_json(
        app,
        "/api/report?url=https%3A%2F%2Fgithub.com%2Focto%2Fdemo",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["repository"]["owner"], "octo");
    assert_eq!(report["repository"]["name"], "demo");

    assert_eq!(report["info"]["status"], "ok");
    assert_eq!(report["info"]["data"]["full_name"], "octo/demo");
    assert_eq!(report["info"]["data"]["stars"], 5);
    assert_eq!(report["info"]["charts"], json!(["key_value"]));
    let rows = &report["info"]["data"]["rows"];
    assert_eq!(rows[0], json!({"label": "Repository Name", "value": "demo"}));
    assert_eq!(rows[3], json!({"label": "Stars", "value": "5"}));
    assert_eq!(rows[7], json!({"label": "Primary Language", "value": "Rust"}));
    assert_eq!(
        rows[9],
        json!({"label": "Last Updated", "value": "2024-02-01T00:00:00Z"})
    );

    let commits = &report["commits"];
    assert_eq!(commits["charts"], json!(["line", "line"]));
    assert_eq!(commits["data"]["total_commits"], 3);
    assert_eq!(
        commits["data"]["monthly"],
        json!([
            {"year": 2024, "period": 1, "count": 2},
            {"year": 2024, "period": 2, "count": 1}
        ])
    );

    let contributors = &report["contributors"]["data"];
    assert_eq!(contributors[0]["user_name"], "a");
    assert_eq!(contributors[0]["contribution_percentage"], 75.0);

    assert_eq!(report["languages"]["charts"], json!(["table", "bar"]));
    assert_eq!(report["languages"]["data"][0]["language_name"], "Rust");
    assert_eq!(report["languages"]["data"][0]["percentage"], 90.0);

    // No pull requests: a count of zero and nothing to chart.
    assert_eq!(report["pull_requests"]["status"], "ok");
    assert_eq!(report["pull_requests"]["data"]["total"], 0);
    assert_eq!(report["pull_requests"]["charts"], json!([]));

    assert_eq!(report["issues"]["data"]["total"], 2);
    assert_eq!(
        report["issues"]["data"]["states"],
        json!([{"state": "open", "count": 1}, {"state": "closed", "count": 1}])
    );
}

#[tokio::test]
async fn test_repo_info_404_keeps_other_sections() {
    let server = mock_github(404).await;
    let app = app_for(server.uri());

    let (status, report) = get_json(app, "/api/repos/octo/demo/report").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["info"]["status"], "error");
    assert_eq!(report["info"]["error"]["kind"], "status");
    assert_eq!(report["info"]["error"]["code"], 404);

    for section in ["commits", "contributors", "languages", "pull_requests", "issues"] {
        assert_eq!(report[section]["status"], "ok", "section {section}");
    }
}

#[tokio::test]
async fn test_unreachable_api_reports_every_section() {
    let app = app_for("http://127.0.0.1:1".to_string());

    let (status, report) = get_json(app, "/api/repos/octo/demo/report").await;

    assert_eq!(status, StatusCode::OK);
    for section in [
        "info",
        "commits",
        "contributors",
        "languages",
        "pull_requests",
        "issues",
    ] {
        assert_eq!(report[section]["status"], "error", "section {section}");
        assert_eq!(report[section]["error"]["kind"], "transport");
    }
}

#[tokio::test]
async fn test_malformed_url_is_rejected() {
    let app = app_for("http://127.0.0.1:1".to_string());

    let (status, body) = get_json(app, "/api/report?url=tensorflow").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert!(error.error.contains("tensorflow"));
}

#[tokio::test]
async fn test_missing_url_parameter_is_json_error() {
    let app = app_for("http://127.0.0.1:1".to_string());

    let (status, body) = get_json(app, "/api/report").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert!(!error.error.is_empty());
}

#[tokio::test]
async fn test_repository_name_with_space_reaches_api_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/de%20mo"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;
    let app = app_for(server.uri());

    let (status, report) = get_json(
        app,
        "/api/report?url=https%3A%2F%2Fgithub.com%2Focto%2Fde%20mo",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["repository"]["name"], "de mo");
    assert_eq!(report["info"]["error"]["kind"], "status");
    assert_eq!(report["info"]["error"]["code"], 404);
}
