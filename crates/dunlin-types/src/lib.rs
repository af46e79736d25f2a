//! Shared types, adapter traits, and error types for the Dunlin invoice
//! reminder engine.
//!
//! This crate contains the foundational types shared between the engine
//! crates and all store adapter implementations. Extracting these into a
//! separate crate allows adapters to compile in parallel with the engine.

pub mod error;
pub mod prelude;
pub mod store_adapter;
pub mod types;

// vim: ts=4
