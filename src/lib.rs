pub mod config;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod population;
pub mod rules;
pub mod search;
// cmd and reports are binary modules (see main.rs).
