use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap};
use serde_json::Value;
use sparkroles_application::{RoleListQuery, RolesApi};
use sparkroles_core::{AccessToken, AppError, AppResult};
use sparkroles_domain::RoleId;
use tracing::{debug, warn};
use url::Url;

mod link_header;

#[cfg(test)]
mod tests;

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 1000;

/// Longest server-requested delay honored between attempts.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Field holding the entries of a Spark list envelope.
const LIST_ITEMS_FIELD: &str = "items";

/// Header Spark uses to correlate a request with its server-side logs.
const TRACKING_ID_HEADER: &str = "trackingid";

/// Connection settings for [`HttpRolesApi`].
#[derive(Debug, Clone)]
pub struct HttpRolesApiConfig {
    /// API root, for example `https://api.ciscospark.com/v1`.
    pub base_url: Url,
    /// Bearer token sent with every request.
    pub access_token: AccessToken,
    /// Attempts per request before giving up on 429/5xx/connection errors.
    pub max_attempts: u8,
    /// Linear backoff step used when the server sends no `Retry-After`.
    pub retry_backoff_ms: u64,
    /// Requested page size for list calls.
    pub page_size: usize,
}

/// Spark REST implementation of the roles resource port.
pub struct HttpRolesApi {
    http_client: reqwest::Client,
    base_url: Url,
    access_token: AccessToken,
    max_attempts: u8,
    retry_backoff_ms: u64,
    page_size: usize,
}

struct JsonPage {
    body: Value,
    next: Option<Url>,
}

impl HttpRolesApi {
    /// Creates a new roles adapter.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: HttpRolesApiConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url,
            access_token: config.access_token,
            max_attempts: config.max_attempts.max(1),
            retry_backoff_ms: config.retry_backoff_ms.max(10),
            page_size: config.page_size.max(1),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!(
                    "API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn roles_url(&self, query: &RoleListQuery) -> AppResult<Url> {
        let page_size = match query.max {
            Some(0) => {
                return Err(AppError::Validation(
                    "role listing max must be greater than zero".to_owned(),
                ));
            }
            Some(max) => max.min(self.page_size),
            None => self.page_size,
        };

        let mut url = self.endpoint(&["roles"])?;
        url.query_pairs_mut()
            .append_pair("max", page_size.to_string().as_str());

        Ok(url)
    }

    async fn get_json(&self, url: &Url) -> AppResult<JsonPage> {
        let mut attempt = 0_u8;
        let mut last_error: Option<AppError> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .get(url.clone())
                .header(header::AUTHORIZATION, self.access_token.bearer_header())
                .header(header::ACCEPT, "application/json")
                .send()
                .await;

            let server_delay = match response {
                Ok(response) if response.status().is_success() => {
                    return read_page(url, response).await;
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    last_error = Some(AppError::RateLimited(format!(
                        "{} throttled after {attempt} attempt(s)",
                        url.path()
                    )));
                    retry_after(response.headers())
                }
                Ok(response) if response.status().is_server_error() => {
                    last_error = Some(AppError::Transport(format!(
                        "transient HTTP status {} for {}",
                        response.status(),
                        url.path()
                    )));
                    None
                }
                Ok(response) => return Err(status_error(url, response).await),
                Err(error) => {
                    last_error = Some(AppError::Transport(format!(
                        "request to {} failed: {error}",
                        url.path()
                    )));
                    None
                }
            };

            if attempt < self.max_attempts {
                let delay = server_delay.unwrap_or_else(|| {
                    Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
                });
                warn!(
                    path = %url.path(),
                    attempt,
                    max_attempts = self.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying Spark API request"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Transport(format!("request to {} exhausted retries", url.path()))
        }))
    }
}

#[async_trait]
impl RolesApi for HttpRolesApi {
    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Value> {
        let mut url = self.roles_url(query)?;
        let mut roles: Vec<Value> = Vec::new();

        for page_number in 1..=MAX_PAGES {
            let page = self.get_json(&url).await?;
            let items = match into_items(page.body) {
                Ok(items) => items,
                // An unexpected first page is handed over untouched so callers
                // can judge its shape.
                Err(body) if page_number == 1 => return Ok(body),
                Err(_) => {
                    return Err(AppError::Transport(format!(
                        "roles page {page_number} is not a list envelope"
                    )));
                }
            };

            roles.extend(items);
            debug!(page = page_number, collected = roles.len(), "fetched roles page");

            if let Some(max) = query.max
                && roles.len() >= max
            {
                roles.truncate(max);
                break;
            }

            match page.next {
                Some(next) if next.origin() == self.base_url.origin() => url = next,
                Some(next) => {
                    warn!(
                        next_host = next.host_str().unwrap_or("-"),
                        "refusing roles page link outside the API origin"
                    );
                    return Err(AppError::Transport(format!(
                        "roles page {page_number} links to a foreign origin '{}'",
                        next.origin().ascii_serialization()
                    )));
                }
                None => break,
            }

            if page_number == MAX_PAGES {
                warn!(max_pages = MAX_PAGES, "stopped following roles pagination");
            }
        }

        Ok(Value::Array(roles))
    }

    async fn get_role(&self, role_id: &RoleId) -> AppResult<Value> {
        let url = self.endpoint(&["roles", role_id.as_str()])?;
        let page = self.get_json(&url).await?;

        Ok(page.body)
    }
}

fn into_items(body: Value) -> Result<Vec<Value>, Value> {
    match body {
        Value::Object(mut envelope) => match envelope.remove(LIST_ITEMS_FIELD) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => {
                envelope.insert(LIST_ITEMS_FIELD.to_owned(), other);
                Err(Value::Object(envelope))
            }
            None => Err(Value::Object(envelope)),
        },
        other => Err(other),
    }
}

async fn read_page(url: &Url, response: reqwest::Response) -> AppResult<JsonPage> {
    let next = link_header::next_page_url(response.headers(), url);
    if let Some(tracking_id) = tracking_id(response.headers()) {
        debug!(path = %url.path(), tracking_id = %tracking_id, "Spark API request succeeded");
    }

    let body = response.json::<Value>().await.map_err(|error| {
        AppError::InvalidResponse(format!(
            "failed to decode JSON body from {}: {error}",
            url.path()
        ))
    })?;

    Ok(JsonPage { body, next })
}

async fn status_error(url: &Url, response: reqwest::Response) -> AppError {
    let status = response.status();
    let tracking_id = tracking_id(response.headers()).unwrap_or_else(|| "-".to_owned());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());

    warn!(
        path = %url.path(),
        status = status.as_u16(),
        tracking_id = %tracking_id,
        "Spark API request rejected"
    );

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(format!(
            "{} rejected the access token",
            url.path()
        )),
        StatusCode::FORBIDDEN => AppError::Forbidden(format!(
            "access token is not allowed to read {}",
            url.path()
        )),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{} does not exist", url.path())),
        _ => AppError::Transport(format!(
            "{} returned status {}: {body}",
            url.path(),
            status.as_u16()
        )),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|seconds| Duration::from_secs(seconds.min(MAX_RETRY_AFTER_SECS)))
}

fn tracking_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACKING_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
