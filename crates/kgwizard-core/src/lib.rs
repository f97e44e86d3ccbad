//! kgwizard core: error taxonomy and configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{GraphConfig, OutputPaths};
pub use error::{Error, Result};
