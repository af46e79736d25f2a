//! Follow-up scheduling engine for Dunlin.
//!
//! This crate holds the invoice-reminder core:
//! - Template rendering with `{variable}` placeholders and blank-line
//!   handling (pure string functions)
//! - Default template/schedule bootstrapping with self-healing invariants
//! - Follow-up generation from an invoice's due date and its effective
//!   schedule
//! - Guard checks protecting the single-default-schedule invariant
//!
//! The engine is store-agnostic: every function takes a
//! [`dunlin_types::store_adapter::StoreAdapter`] reference, so tests can
//! substitute an in-memory fake and deployments pick a concrete adapter.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod generator;
pub mod guard;
pub mod render;
pub mod vars;

mod prelude;

pub use bootstrap::{ensure_default_schedule, ensure_default_templates};
pub use generator::{
	generate_follow_ups, regenerate_all, regenerate_for_invoice, restart_reminders,
	RegenerateSummary,
};
pub use guard::{can_deactivate_schedule, can_delete_schedule, set_default_schedule, GuardDecision};
pub use render::{placeholders, render, TemplateVars};

// vim: ts=4
