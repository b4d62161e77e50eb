use std::sync::Arc;

use sparkroles_core::{AppError, AppResult};
use sparkroles_domain::{Role, RoleId, RolesCollection, is_roles};
use tracing::{debug, warn};

use crate::role_ports::{RoleListQuery, RolesApi};


/// Application service composing role retrieval with payload validation.
#[derive(Clone)]
pub struct RoleService {
    api: Arc<dyn RolesApi>,
}

impl RoleService {
    /// Creates a role service.
    #[must_use]
    pub fn new(api: Arc<dyn RolesApi>) -> Self {
        Self { api }
    }

    /// Fetches the roles collection and reports whether it is well formed.
    ///
    /// Transport errors are returned unchanged and the payload is never
    /// inspected in that case. A malformed payload is `Ok(false)`.
    pub async fn verify_roles(&self, query: &RoleListQuery) -> AppResult<bool> {
        debug!(max = ?query.max, "fetching roles for verification");
        let payload = self.api.list_roles(query).await?;
        let valid = is_roles(&payload);

        if !valid {
            warn!(payload_kind = payload_kind(&payload), "roles payload failed validation");
        }

        Ok(valid)
    }

    /// Fetches the roles collection as typed roles.
    pub async fn list_roles(&self, query: &RoleListQuery) -> AppResult<RolesCollection> {
        debug!(max = ?query.max, "listing roles");
        let payload = self.api.list_roles(query).await?;

        RolesCollection::from_value(&payload).ok_or_else(|| {
            warn!(payload_kind = payload_kind(&payload), "roles payload failed validation");
            AppError::InvalidResponse(format!(
                "roles endpoint returned a malformed collection ({})",
                payload_kind(&payload)
            ))
        })
    }

    /// Fetches one role by identifier.
    pub async fn get_role(&self, role_id: &RoleId) -> AppResult<Role> {
        debug!(role_id = %role_id, "fetching role");
        let payload = self.api.get_role(role_id).await?;

        Role::from_value(&payload).ok_or_else(|| {
            warn!(
                role_id = %role_id,
                payload_kind = payload_kind(&payload),
                "role payload failed validation"
            );
            AppError::InvalidResponse(format!(
                "role endpoint returned a malformed role for '{role_id}'"
            ))
        })
    }
}

fn payload_kind(payload: &serde_json::Value) -> &'static str {
    match payload {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
