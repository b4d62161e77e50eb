//! Role entities returned by the Spark roles resource.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sparkroles_core::{AppError, AppResult};

use crate::validation::{is_role, is_roles};

/// Field carrying the role identifier.
pub const ROLE_ID_FIELD: &str = "id";

/// Field carrying the human-readable role label.
pub const ROLE_NAME_FIELD: &str = "name";

/// Server-assigned role identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    /// Creates a validated role identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(AppError::Validation(
                "role id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RoleId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// A permission grouping assignable to a user.
///
/// Fields other than `id` and `name` are kept verbatim in [`Role::extra`] so a
/// role can be written back out exactly as the server described it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    id: RoleId,
    name: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Role {
    /// Creates a role without additional fields.
    #[must_use]
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Builds a typed role from a raw payload.
    ///
    /// Returns `None` exactly when [`is_role`] rejects the value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_role(value) {
            return None;
        }

        let object = value.as_object()?;
        let id = object
            .get(ROLE_ID_FIELD)
            .and_then(Value::as_str)
            .and_then(|id| RoleId::new(id).ok())?;
        let name = object.get(ROLE_NAME_FIELD).and_then(Value::as_str)?;
        let extra = object
            .iter()
            .filter(|(key, _)| key.as_str() != ROLE_ID_FIELD && key.as_str() != ROLE_NAME_FIELD)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            id,
            name: name.to_owned(),
            extra,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the role label.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns fields the server sent beyond `id` and `name`.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Converts the role back into its raw JSON form.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut object = self.extra;
        object.insert(ROLE_ID_FIELD.to_owned(), Value::String(self.id.into()));
        object.insert(ROLE_NAME_FIELD.to_owned(), Value::String(self.name));
        Value::Object(object)
    }
}

/// Ordered roles as listed by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RolesCollection(Vec<Role>);

impl RolesCollection {
    /// Builds a typed collection from a raw payload.
    ///
    /// Returns `None` exactly when [`is_roles`] rejects the value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_roles(value) {
            return None;
        }

        value
            .as_array()?
            .iter()
            .map(Role::from_value)
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Returns the roles in server order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        self.0.as_slice()
    }

    /// Returns the number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the collection holds no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds a role by identifier.
    #[must_use]
    pub fn find(&self, role_id: &RoleId) -> Option<&Role> {
        self.0.iter().find(|role| role.id() == role_id)
    }

    /// Converts the collection back into its raw JSON array.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Array(self.0.into_iter().map(Role::into_value).collect())
    }
}

impl IntoIterator for RolesCollection {
    type Item = Role;
    type IntoIter = std::vec::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
