//! Workload generation
//!
//! The driver issues randomized CRUD traffic against a key-value service,
//! tracking which keys it believes exist so retrieve/update/delete always
//! target plausible keys. Authoritative ALREADY_EXISTS and NOT_FOUND
//! responses prune the local view.

pub mod driver;
pub mod keyset;

pub use driver::WorkloadDriver;
pub use keyset::KnownKeys;
