//! Core types and trait definitions for the Upkeep equipment tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends move raw [`cell::Cell`]s; everything that interprets them
//! (column resolution, status derivation, record updates) lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod cell;
pub mod columns;
pub mod dataset;
pub mod equipment;
pub mod error;
pub mod history;
pub mod status;
pub mod store;

pub use error::{Error, Result};
