//! varsub CLI library
//!
//! Exposes the CLI entry point so it can be embedded or tested from
//! other crates.

mod cli;

pub use cli::run;
