//! Common utilities and types shared across kvload

pub mod config;
pub mod error;
pub mod payload;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use payload::{random_bytes, random_bytes_with};
pub use utils::{format_bytes, parse_duration};
