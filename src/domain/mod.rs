pub mod config;
pub mod path;
pub mod report;
pub mod snapshot;
pub mod testspec;
