//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_roles_api;

pub use http_roles_api::{HttpRolesApi, HttpRolesApiConfig};
