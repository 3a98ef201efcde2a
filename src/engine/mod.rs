pub mod aggregate;
pub mod diff;
pub mod eval;
pub mod operator;
pub mod runner;
