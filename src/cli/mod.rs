//! Command handlers behind the `vault` binary

pub mod commands;

pub use commands::*;
