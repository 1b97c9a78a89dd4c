//! Math utilities for the control core.
//!
//! This module provides vector helpers and a minimal rigid pose type built on `glam`.

pub mod pose;
pub mod vector;
