//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and the scalar/vector helpers shared by every kernel
//! - Frame time intervals
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
