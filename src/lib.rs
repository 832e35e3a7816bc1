// Session-scoped image staging engine — search, stage, select, bundle, purge.

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod source;

pub use error::{Error, Result};
