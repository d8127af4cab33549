//! # strata-assets
//!
//! Prepares the externally built inputs the composition consumes:
//! - **Hash**: SHA-256 digests of files and byte buffers, and hash validation.
//! - **Bundle**: the function archive locator forwarded to the function resource.
//! - **Content**: the static content set scanned from a UI build directory.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bundle;
pub mod content;
pub mod hash;
