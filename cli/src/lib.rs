//! GLP-1 Calculator CLI
//!
//! Command layer and configuration for `glp1-calc`. The binary in
//! `main.rs` only parses arguments, sets up logging and prints what the
//! commands return.

pub mod commands;
pub mod config;
