//! # strata-construct
//!
//! The graph construction and dependency-resolution layer of strata.
//!
//! Handles:
//! - **Attribute**: literal values and lazy references to other resources' attributes.
//! - **Resource**: typed resource declarations with attribute bags and explicit dependencies.
//! - **Construct**: the arena-backed scope tree that owns resources and derives logical ids.
//! - **Graph**: flattening the tree and validating the merged dependency edges.
//! - **Synth**: deterministic topological ordering and artifact serialization.
//! - **Driver**: independent per-environment pipelines over a shared composition.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod attribute;
pub mod construct;
pub mod driver;
pub mod graph;
pub mod resource;
pub mod synth;
