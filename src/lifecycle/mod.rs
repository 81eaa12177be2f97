//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Bind listener → Register resources → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger (signal, admin API, fault)
//!     → Idle → Draining: release every resource concurrently
//!     → race joint completion against one deadline
//!     → Completed(Clean | Partial | TimedOut) → exit code
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGHUP → shutdown(deadline), repeats coalesced
//! ```
//!
//! # Design Decisions
//! - The registry is built once and shared read-only
//! - Resource faults are values in reports, never errors of the orchestrator
//! - Shutdown has a deadline: the process never waits on a stuck release

pub mod registry;
pub mod resource;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use registry::{RegistrationError, ResourceRegistry};
pub use resource::{ManagedResource, ProbeOutcome, ReleaseOutcome};
pub use shutdown::{
    LifecycleState, ShutdownCause, ShutdownOrchestrator, ShutdownReport, ShutdownResult,
};
