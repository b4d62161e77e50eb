//! `Link` header parsing for paginated Spark list endpoints.

use reqwest::header::{HeaderMap, LINK};
use url::Url;

/// Returns the `rel="next"` target from the response headers.
///
/// Relative targets are resolved against `current`. Malformed entries are
/// skipped.
pub(super) fn next_page_url(headers: &HeaderMap, current: &Url) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|entry| parse_next_entry(entry, current))
}

fn parse_next_entry(entry: &str, current: &Url) -> Option<Url> {
    let mut parts = entry.split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;

    let is_next = parts.any(|parameter| {
        let Some((key, value)) = parameter.split_once('=') else {
            return false;
        };

        key.trim().eq_ignore_ascii_case("rel")
            && value
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .any(|rel| rel.eq_ignore_ascii_case("next"))
    });

    if !is_next {
        return None;
    }

    current.join(target).ok()
}
