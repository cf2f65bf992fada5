//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! SocketAddr (host + site port)
//!     → listener.rs (bind, report the bound address)
//!     → tls.rs (optional rustls config from PEM files)
//!     → http::server router
//! ```
//!
//! # Design Decisions
//! - Each listener is bound inside its own instance task, so a busy port
//!   takes down only that instance
//! - TLS is optional and applies to every listener alike

pub mod listener;
pub mod tls;
