//! Static file server with 404 fallback and multiple listeners.

pub mod config;
pub mod fs;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod net;
pub mod observability;

pub use config::schema::ServeConfig;
pub use lifecycle::{Coordinator, Running, ShutdownReport};
