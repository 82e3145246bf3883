//! Shared helpers for the pipeline stages.

pub mod command;
pub mod gzip;
pub mod size;
