//! # strata-common
//!
//! Shared types, error definitions, the per-environment settings model,
//! and constants used across the entire strata workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives the construct engine, the
//! workshop composition, and the CLI build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
