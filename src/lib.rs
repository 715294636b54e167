// src/lib.rs

pub mod backup;
pub mod config;
pub mod constants;
pub mod errors;
pub mod orchestrator;
pub mod runner;
pub mod script;
pub mod state;
pub mod tweaks;
pub mod utils;
pub mod worker;
