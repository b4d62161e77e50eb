//! Application services and ports.

#![forbid(unsafe_code)]

mod role_ports;
mod role_service;

pub use role_ports::{RoleListQuery, RolesApi};
pub use role_service::RoleService;
