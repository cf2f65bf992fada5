//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)          optional TOML file (loader.rs)
//!     → parse repeated -p/-d/-e        → deserialize ServeConfig
//!     → zip into SiteConfig list  ──┬──┘
//!                                   ▼
//!                      validation.rs (semantic checks)
//!                                   ▼
//!                      ServeConfig (validated, immutable)
//!                                   ▼
//!                      lifecycle::Coordinator
//! ```
//!
//! # Design Decisions
//! - Built once at startup and passed by reference; no global state
//! - Every field has a default so a bare invocation serves `.` on 8100
//! - Validation collects all errors, not just the first

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::FsKind;
pub use schema::ServeConfig;
pub use schema::SiteConfig;
pub use schema::TlsConfig;
