//! Concrete managed resources.
//!
//! # Resources
//! - `listener`: the HTTP serve task (graceful drain on release)
//! - `memory`: resident memory against a ceiling (local, synchronous probe)
//! - `disk`: free space on a filesystem (local, synchronous probe)
//! - `tcp`: a TCP dependency such as a database or cache
//! - `http`: an HTTP dependency with a health path
//!
//! # Design Decisions
//! - Every collaborator goes through the same `ManagedResource` interface
//! - Ordered shutdown, when needed, is composed inside a single resource

pub mod disk;
pub mod http;
pub mod listener;
pub mod memory;
pub mod tcp;

pub use disk::DiskResource;
pub use http::HttpDependency;
pub use listener::ListenerResource;
pub use memory::MemoryResource;
pub use tcp::TcpDependency;
