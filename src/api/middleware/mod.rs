// Middleware module - error mapping and observability

pub mod error_mapper;
pub mod observability;

pub use error_mapper::{map_errors, route_not_found};
