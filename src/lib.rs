//! # kvload
//!
//! A synthetic workload generator for gRPC key-value services:
//! - Randomized create/retrieve/update/delete traffic
//! - Exponentially sized keys and values around configurable means
//! - Client-local tracking of keys believed to exist server-side
//! - In-memory reference service for local runs and tests
//!
//! ## Usage
//!
//! ### Start the reference service
//! ```bash
//! kvload serve --bind 127.0.0.1:50051
//! ```
//!
//! ### Drive load against it
//! ```bash
//! kvload run \
//!   --target http://127.0.0.1:50051 \
//!   --duration 60s \
//!   --mean-value-size 65536
//! ```
//!
//! The driver keeps issuing RPCs until the duration elapses (or Ctrl-C),
//! then reports how many it completed and at what rate.

pub mod common;
pub mod server;
pub mod workload;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use server::KvService;
pub use workload::{KnownKeys, WorkloadDriver};

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("kvload");
}

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
