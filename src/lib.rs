pub mod adapters;
pub mod capture;
pub mod cmd;
pub mod domain;
pub mod engine;
pub mod render;
pub mod store;
pub mod util;
