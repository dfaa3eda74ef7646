//! Domain model module declarations.

pub mod session;
pub mod sub_resource;
