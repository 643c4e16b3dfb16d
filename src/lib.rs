//! Document batch validation and lot assembly against an `.xlsx` manifest.
//!
//! The pipeline runs in three stages: [`validate`] matches incoming files to
//! manifest rows by filename, [`resolve`] recovers the stragglers by reading
//! the files themselves, and [`organize`] distributes everything into
//! size-balanced lot directories, each with a generated spreadsheet listing
//! its contents.

pub mod cli;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fsops;
pub mod manifest;
pub mod organize;
pub mod ports;
pub mod rename;
pub mod resolve;
pub mod template;
pub mod validate;

pub use error::{Error, Result};
