pub mod config;
pub mod context;
pub mod logging;
pub mod snapshot;
pub mod version_probe;
