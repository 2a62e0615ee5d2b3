pub mod agents;
pub mod archive;
pub mod client;
pub mod config;
pub mod deploy;
pub mod docker;
pub mod dockerfile;
pub mod error;
pub mod io;
pub mod lint;
pub mod models;
pub mod paths;
pub mod poll;
pub mod preflight;
pub mod project;
pub mod provision;
pub mod resources;
pub mod spec;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NeptuneError, Result};
