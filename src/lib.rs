//! SWAPSCAN: supervised swap-venue scanner.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod rpc;
pub mod strategy;
pub mod types;
pub mod venue;
