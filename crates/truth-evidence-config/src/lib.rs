// crates/truth-evidence-config/src/lib.rs
// ============================================================================
// Module: Truth Evidence Config Library
// Description: Configuration model and validation for the evidence engine.
// Purpose: Single source of truth for truth-evidence.toml semantics.
// Dependencies: truth-evidence-core, truth-evidence-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `truth-evidence-config` defines the configuration model for the evidence
//! engine tooling. Validation is strict and fail-closed: a config that names
//! an unknown ruleset, an incomplete store, or an out-of-range limit is
//! rejected before anything is opened.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
