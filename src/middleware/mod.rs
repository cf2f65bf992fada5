//! Per-listener middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → health.rs      /health, /ready short-circuit
//!     → dump.rs        request/response header dump
//!     → access_log.rs  one line per request
//!     → fallback.rs    404 → replay once with the fallback path
//!     → leaf           FileServer, or NotFound for a health-only listener
//! ```
//!
//! # Design Decisions
//! - Each layer is a generic struct wrapping the next; the chain type is
//!   known at compile time and shared behind one `Arc` per listener
//! - Disabled layers stay in the chain as pass-throughs, so every listener
//!   has the same type

pub mod access_log;
pub mod dump;
pub mod fallback;
pub mod health;

pub use access_log::AccessLog;
pub use dump::HeaderDump;
pub use fallback::Fallback;
pub use health::Health;

use crate::http::handler::Handler;

/// Switches for one listener's chain.
#[derive(Debug, Clone, Default)]
pub struct ChainOptions {
    pub fallback: Option<String>,
    pub health: bool,
    pub log_access: bool,
    pub log_fallback: bool,
    pub log_headers: bool,
    /// Distinguishes listeners in shared logs, e.g. `:8100`.
    pub label: String,
}

/// The full chain in front of a leaf handler.
pub type Chain<L> = Health<HeaderDump<AccessLog<Fallback<L>>>>;

/// Wrap `leaf` in every layer, innermost first.
pub fn build_chain<L: Handler>(leaf: L, options: &ChainOptions) -> Chain<L> {
    let fallback = Fallback::new(leaf, options.fallback.as_deref(), options.log_fallback);
    let access = AccessLog::new(fallback, options.log_access, options.label.clone());
    let dump = HeaderDump::new(access, options.log_headers, options.label.clone());
    Health::new(dump, options.health)
}
