use std::sync::OnceLock;

pub mod bundle;
pub mod bundle_fs;
pub mod commands;
pub mod compression;
pub mod cursor;
pub mod directory;
pub mod error;
pub mod header;

/// Application-level verbosity
pub static VERBOSE: OnceLock<bool> = OnceLock::new();
