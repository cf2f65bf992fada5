//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs, startup.rs):
//!     ServeConfig → resolve roots → build backends + chains → spawn instances
//!
//! Instances (instance.rs):
//!     bind → report address → serve until the shutdown broadcast
//!          → wait for request tasks still running
//!
//! Shutdown (coordinator.rs, shutdown.rs):
//!     signal → broadcast → join each instance → close its watcher
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → resolve wait_for_termination()
//! ```
//!
//! # Design Decisions
//! - Fail fast: configuration and backend errors abort before any bind
//! - A failed bind ends only its own instance
//! - A watcher is closed only after its instance has stopped serving

pub mod coordinator;
pub mod instance;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use coordinator::{Coordinator, Running, ShutdownReport, StartupError};
pub use shutdown::Shutdown;
