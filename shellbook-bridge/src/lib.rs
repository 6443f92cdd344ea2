//! Shellbook host library target.
//!
//! The binary entry point is in `main.rs`; the modules live here so
//! `tests/*.rs` can drive the host without a terminal.

pub mod app;
pub mod builtins;
pub mod config;
pub mod render;
