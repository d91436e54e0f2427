// src/dag/mod.rs

//! DAG assembly and serialization.
//!
//! - [`builder`] accumulates rules, deduplicates targets and checks required
//!   inputs.
//! - [`document`] renders the text document the execution engine consumes.
//! - [`graph`] derives producer -> consumer edges for ordering and cycle
//!   checks.

pub mod builder;
pub mod document;
pub mod graph;

pub use builder::{BuildOptions, GraphBuilder};
pub use document::{count_rule_blocks, is_valid_header_key, render_document};
pub use graph::RuleGraph;
