//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod role;
mod validation;

pub use role::{ROLE_ID_FIELD, ROLE_NAME_FIELD, Role, RoleId, RolesCollection};
pub use validation::{is_role, is_roles};
