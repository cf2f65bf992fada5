//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware::access_log  → target "access"
//! middleware::fallback    → target "fallback"
//! middleware::dump        → target "headers"
//! lifecycle, fs, http     → module targets
//!     → logging.rs (EnvFilter + fmt layer) → stderr
//! ```
//!
//! # Design Decisions
//! - Request-level lines go through `tracing` with fixed targets, so they can
//!   be filtered independently (`RUST_LOG=access=info,warn`)
//! - No metrics endpoint; a static server's useful signal is its access log

pub mod logging;
