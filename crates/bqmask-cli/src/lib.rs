//! Library components of the `bqmask` command-line tool.

pub mod config;
pub mod logging;
