//! Command implementations for the `ymdeck` binary.

pub mod check;
pub mod plugin;
