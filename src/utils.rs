// src/utils.rs

pub mod elevation;
pub mod registry;
