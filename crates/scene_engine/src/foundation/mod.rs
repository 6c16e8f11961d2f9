//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the Euler convention
//! - Logging utilities

pub mod math;
pub mod logging;
