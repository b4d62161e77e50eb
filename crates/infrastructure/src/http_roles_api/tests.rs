use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use sparkroles_application::{RoleListQuery, RolesApi};
use sparkroles_core::{AccessToken, AppError};
use sparkroles_domain::{RoleId, is_roles};
use url::Url;

use super::{HttpRolesApi, HttpRolesApiConfig, MAX_RETRY_AFTER_SECS, retry_after};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const TOKEN: &str = "test-token";

async fn serve(router: Router) -> Result<Url, Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(Url::parse(&format!("http://{address}/v1"))?)
}

fn roles_api(base_url: Url, token: &str, max_attempts: u8) -> Result<HttpRolesApi, AppError> {
    Ok(HttpRolesApi::new(
        reqwest::Client::new(),
        HttpRolesApiConfig {
            base_url,
            access_token: AccessToken::new(token)?,
            max_attempts,
            retry_backoff_ms: 10,
            page_size: 2,
        },
    ))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Bearer test-token")
}

async fn paged_roles(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid token"})))
            .into_response();
    }

    match params.get("cursor").map(String::as_str) {
        None if params.contains_key("max") => (
            [(header::LINK, "</v1/roles?cursor=2>; rel=\"next\"")],
            Json(json!({"items": [
                {"id": "r1", "name": "Full Administrator"},
                {"id": "r2", "name": "User Administrator"}
            ]})),
        )
            .into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
        Some(_) => Json(json!({"items": [
            {"id": "r3", "name": "Compliance Officer", "scope": "org"}
        ]}))
        .into_response(),
    }
}

async fn counted<F>(calls: &AtomicUsize, respond: F) -> Response
where
    F: FnOnce(usize) -> Response,
{
    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
    respond(call)
}

#[tokio::test]
async fn list_roles_follows_pagination_and_unwraps_envelopes() -> TestResult {
    let base_url = serve(Router::new().route("/v1/roles", get(paged_roles))).await?;
    let api = roles_api(base_url, TOKEN, 1)?;

    let roles = api.list_roles(&RoleListQuery::all()).await?;

    assert!(is_roles(&roles));
    assert_eq!(
        roles,
        json!([
            {"id": "r1", "name": "Full Administrator"},
            {"id": "r2", "name": "User Administrator"},
            {"id": "r3", "name": "Compliance Officer", "scope": "org"}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn list_roles_stops_once_max_roles_are_collected() -> TestResult {
    let base_url = serve(Router::new().route("/v1/roles", get(paged_roles))).await?;
    let api = roles_api(base_url, TOKEN, 1)?;

    let roles = api.list_roles(&RoleListQuery::with_max(1)).await?;

    assert_eq!(roles, json!([{"id": "r1", "name": "Full Administrator"}]));
    Ok(())
}

#[tokio::test]
async fn list_roles_rejects_zero_max_before_sending() -> TestResult {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/v1/roles",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                counted(&calls, |_| Json(json!({"items": []})).into_response()).await
            }),
        )
        .with_state(calls.clone());
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let result = api.list_roles(&RoleListQuery::with_max(0)).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn list_roles_hands_back_unexpected_first_page() -> TestResult {
    let router = Router::new().route(
        "/v1/roles",
        get(|| async { Json(json!({"message": "maintenance", "items": "none"})) }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let roles = api.list_roles(&RoleListQuery::all()).await?;

    assert_eq!(roles, json!({"message": "maintenance", "items": "none"}));
    assert!(!is_roles(&roles));
    Ok(())
}

#[tokio::test]
async fn list_roles_fails_when_a_later_page_is_not_an_envelope() -> TestResult {
    let router = Router::new().route(
        "/v1/roles",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.contains_key("cursor") {
                Json(json!([])).into_response()
            } else {
                (
                    [(header::LINK, "</v1/roles?cursor=2>; rel=\"next\"")],
                    Json(json!({"items": []})),
                )
                    .into_response()
            }
        }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn list_roles_maps_rejected_token_to_unauthorized() -> TestResult {
    let base_url = serve(Router::new().route("/v1/roles", get(paged_roles))).await?;
    let api = roles_api(base_url, "revoked-token", 3)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn list_roles_retries_after_throttling() -> TestResult {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/v1/roles",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                counted(&calls, |call| {
                    if call == 1 {
                        (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")])
                            .into_response()
                    } else {
                        Json(json!({"items": [{"id": "r1", "name": "Admin"}]})).into_response()
                    }
                })
                .await
            }),
        )
        .with_state(calls.clone());
    let api = roles_api(serve(router).await?, TOKEN, 3)?;

    let roles = api.list_roles(&RoleListQuery::all()).await?;

    assert_eq!(roles, json!([{"id": "r1", "name": "Admin"}]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn list_roles_reports_rate_limit_after_exhausting_attempts() -> TestResult {
    let router = Router::new().route(
        "/v1/roles",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")]) }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 2)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::RateLimited(_))));
    Ok(())
}

#[tokio::test]
async fn list_roles_gives_up_on_persistent_server_errors() -> TestResult {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/v1/roles",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                counted(&calls, |_| StatusCode::BAD_GATEWAY.into_response()).await
            }),
        )
        .with_state(calls.clone());
    let api = roles_api(serve(router).await?, TOKEN, 2)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn list_roles_reports_undecodable_body() -> TestResult {
    let router = Router::new().route("/v1/roles", get(|| async { "<html>oops</html>" }));
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::InvalidResponse(_))));
    Ok(())
}

#[tokio::test]
async fn list_roles_reports_connection_failure_as_transport_error() -> TestResult {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    drop(listener);
    let api = roles_api(Url::parse(&format!("http://{address}/v1"))?, TOKEN, 1)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn get_role_returns_body_for_one_role() -> TestResult {
    let router = Router::new().route(
        "/v1/roles/{role_id}",
        get(|headers: HeaderMap, Path(role_id): Path<String>| async move {
            if !authorized(&headers) {
                return StatusCode::UNAUTHORIZED.into_response();
            }

            if role_id == "r1" {
                Json(json!({"id": "r1", "name": "Full Administrator"})).into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let role = api.get_role(&RoleId::new("r1")?).await?;
    assert_eq!(role, json!({"id": "r1", "name": "Full Administrator"}));

    let missing = api.get_role(&RoleId::new("r9")?).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn get_role_maps_forbidden_status() -> TestResult {
    let router = Router::new().route(
        "/v1/roles/{role_id}",
        get(|| async { StatusCode::FORBIDDEN }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let result = api.get_role(&RoleId::new("r1")?).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    Ok(())
}

#[test]
fn roles_url_keeps_base_path_and_caps_page_size() -> TestResult {
    let api = roles_api(Url::parse("https://api.ciscospark.com/v1/")?, TOKEN, 1)?;

    let url = api.roles_url(&RoleListQuery::with_max(50))?;
    assert_eq!(url.as_str(), "https://api.ciscospark.com/v1/roles?max=2");

    let url = api.roles_url(&RoleListQuery::with_max(1))?;
    assert_eq!(url.as_str(), "https://api.ciscospark.com/v1/roles?max=1");
    Ok(())
}

#[test]
fn role_endpoint_escapes_identifier() -> TestResult {
    let api = roles_api(Url::parse("https://api.ciscospark.com/v1")?, TOKEN, 1)?;

    let url = api.endpoint(&["roles", "a/b c"])?;

    assert_eq!(url.as_str(), "https://api.ciscospark.com/v1/roles/a%2Fb%20c");
    Ok(())
}

#[tokio::test]
async fn list_roles_never_follows_links_to_another_origin() -> TestResult {
    let foreign_calls = Arc::new(AtomicUsize::new(0));
    let foreign = Router::new()
        .route(
            "/steal",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                counted(&calls, |_| Json(json!({"items": []})).into_response()).await
            }),
        )
        .with_state(foreign_calls.clone());
    let foreign_url = serve(foreign).await?;
    let foreign_link = format!(
        "<http://{}:{}/steal>; rel=\"next\"",
        foreign_url.host_str().unwrap_or("127.0.0.1"),
        foreign_url.port().unwrap_or(80)
    );

    let router = Router::new().route(
        "/v1/roles",
        get(move || {
            let foreign_link = foreign_link.clone();
            async move {
                (
                    [(header::LINK, foreign_link)],
                    Json(json!({"items": [{"id": "r1", "name": "Admin"}]})),
                )
                    .into_response()
            }
        }),
    );
    let api = roles_api(serve(router).await?, TOKEN, 1)?;

    let result = api.list_roles(&RoleListQuery::all()).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert_eq!(foreign_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn retry_after_is_capped() -> TestResult {
    let mut headers = HeaderMap::new();
    headers.insert(header::RETRY_AFTER, HeaderValue::from_static("99999999"));
    assert_eq!(
        retry_after(&headers),
        Some(Duration::from_secs(MAX_RETRY_AFTER_SECS))
    );

    headers.insert(header::RETRY_AFTER, HeaderValue::from_static("2"));
    assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));
    Ok(())
}
