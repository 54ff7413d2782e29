//! Schema Snapshot Module
//!
//! Detecting what changed in a notebook's declared output schema.
//! This module provides:
//! - Extraction of declared schemas from notebook source
//! - Schema diff engine (comparing snapshots)
//! - The baseline side-file store

pub mod diff;
pub mod extract;
pub mod store;

pub use diff::{DiffEngine, SchemaChange, SchemaDiff, Severity};
pub use extract::SchemaExtractor;
pub use store::BaselineStore;
