//! Application wiring: services, routes, server.

pub mod routes;
pub mod server;
pub mod services;

pub use routes::setup_routes;
pub use services::build_state;
