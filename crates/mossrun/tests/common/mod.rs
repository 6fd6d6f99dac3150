//! Shared test utilities for mossrun integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated job processing with a temp upload tree and database
//! - Scripted MOSS doubles for driving the retry paths deterministically
//! - Minimal MOSS and report servers for end-to-end runs over real sockets

pub mod fakes;
pub mod harness;
pub mod servers;

pub use fakes::*;
pub use harness::TestHarness;
