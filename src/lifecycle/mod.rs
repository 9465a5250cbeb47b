//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!     SIGUSR1 → diagnostic dump, keep running
//!
//! Shutdown (shutdown.rs):
//!     one-shot quit notification awaited by the daemon
//!
//! State (state.rs):
//!     Init → Configuring → Starting → Running → ShuttingDown → Terminated
//! ```
//!
//! # Design Decisions
//! - The daemon takes a `Shutdown` instead of listening for signals itself
//! - Ordered shutdown: stop accept, drain, join worker, close log file
//! - Drain has a timeout: the serve task is aborted after the deadline

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use state::{LifecycleState, StateTracker};
