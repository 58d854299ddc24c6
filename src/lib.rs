//! QuoteForge: manufacturing cost estimation
//!
//! Estimates the cost of a part from its volume, a material and a set of
//! manufacturing processes, using rates from a periodically refreshed
//! catalog with per-line-item overrides.

pub mod cli;
pub mod core;
pub mod entities;
pub mod logging;
pub mod yaml;
