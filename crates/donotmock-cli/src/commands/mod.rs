//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_signatures;
pub mod output;
