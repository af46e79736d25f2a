//! Common imports for this crate.

pub use dunlin_types::prelude::*;
pub use dunlin_types::store_adapter::StoreAdapter;

// vim: ts=4
