//! # strata-stacks
//!
//! The workshop application expressed as constructs. Each module adds one
//! subtree to an environment's construct tree; [`workshop::compose`] wires
//! them together the same way for every environment.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod api_gateway;
pub mod lambda;
pub mod static_site;
pub mod workshop;
