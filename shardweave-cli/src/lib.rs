//! Library entry for shardweave-cli used by integration tests and embedding.

pub mod commands;
pub mod fragment_file;
pub mod manifest;

// Re-export commands for convenience
pub use commands::*;

pub use crate::fragment_file::FragmentFile;
pub use crate::manifest::{FragmentEntry, Manifest};
