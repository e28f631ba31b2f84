//! Integration tests for statelens
//!
//! These tests verify that capture, tracing, recording and synthesis work
//! together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod capture_flow;
pub mod cli;
pub mod synth_flow;
