use async_trait::async_trait;
use serde_json::Value;
use sparkroles_core::AppResult;
use sparkroles_domain::RoleId;

/// Roles listing query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleListQuery {
    /// Optional upper bound on the number of roles returned.
    pub max: Option<usize>,
}

impl RoleListQuery {
    /// Creates a query returning every role.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query returning at most `max` roles.
    #[must_use]
    pub fn with_max(max: usize) -> Self {
        Self { max: Some(max) }
    }
}

/// Remote roles resource port.
///
/// Adapters own transport, authentication and pagination. They return the
/// decoded body without checking its shape; callers validate it.
#[async_trait]
pub trait RolesApi: Send + Sync {
    /// Fetches the roles collection.
    ///
    /// Fails with a transport-level [`sparkroles_core::AppError`] when the
    /// request cannot be completed.
    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Value>;

    /// Fetches one role by identifier.
    async fn get_role(&self, role_id: &RoleId) -> AppResult<Value>;
}
