use std::fmt::{Debug, Formatter};

use crate::{AppError, AppResult, NonEmptyString};

/// Authorization scheme accepted in front of a pasted token.
const BEARER_SCHEME: &str = "bearer";

/// Bearer token used to authenticate against the Spark REST API.
///
/// The value is never printed by `Debug`, so the token can travel inside
/// configuration structs that end up in log fields.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(NonEmptyString);

impl AccessToken {
    /// Creates an access token from a raw value.
    ///
    /// Surrounding whitespace is stripped and an optional `Bearer` scheme
    /// (any case) is accepted so tokens copied from a developer portal work
    /// as-is.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let token = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => rest.trim(),
            _ if trimmed.eq_ignore_ascii_case(BEARER_SCHEME) => "",
            _ => trimmed,
        };

        if token.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "access token must not contain whitespace".to_owned(),
            ));
        }

        NonEmptyString::new(token)
            .map(Self)
            .map_err(|_| AppError::Validation("access token must not be empty".to_owned()))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0.as_str())
    }
}

impl Debug for AccessToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("AccessToken(<redacted>)")
    }
}
