//! Filesystem and HTTP helpers.

pub mod fs;
pub mod http;
