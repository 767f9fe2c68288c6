//! Shared utilities for Integra.
//!
//! This crate provides the cross-cutting concerns used by every other Integra
//! crate: the unified error type and small filesystem helpers.

pub mod errors;
pub mod fs;
