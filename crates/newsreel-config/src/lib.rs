//! `Key=Value` configuration files declaring news servers.

mod error;
mod model;
mod parse;

pub use crate::error::ConfigError;
pub use crate::model::Config;
pub use crate::parse::{
    DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, DEFAULT_TLS_PORT, extract_servers, interpolate, parse_bool,
    parse_config,
};
