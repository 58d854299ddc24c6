//! CLI command implementations

pub mod catalog;
pub mod completions;
pub mod config;
pub mod export;
pub mod init;
pub mod quote;
