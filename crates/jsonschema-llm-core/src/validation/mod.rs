//! Validation utilities for JSON Schema output compliance.
//!
//! This module provides read-only validation functions that audit schemas
//! against provider-specific constraints without mutating them.

pub mod strict_mode;
