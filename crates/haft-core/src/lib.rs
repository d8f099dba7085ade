//! Core types for the Haft handle primitives.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces every structure in the workspace agrees on: the handle width and
//! its sentinel, the error type, capacity configuration, and the hash
//! mixers used by keyed lookups.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handle;
pub mod hash;

pub use config::CapacityConfig;
pub use error::HandleError;
pub use handle::{Handle, HandleIndex, INVALID_HANDLE};
pub use hash::{mix32, mix64, MapKey};
