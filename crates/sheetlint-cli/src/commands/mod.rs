//! CLI command implementations.

pub mod config;
pub mod convert;
pub mod diff;
pub mod lint;
pub mod register;
