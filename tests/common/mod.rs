//! Shared test utilities for statelens
//!
//! This module provides common helpers for integration tests:
//! - Container definitions exercising model, message and relay reads
//! - A minimal runtime that reports every dispatch to an instrumenter
//! - A backend that collects everything it is sent

pub mod containers;
