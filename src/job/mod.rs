// src/job/mod.rs

//! Jobs and the rules they render into.
//!
//! - [`model`] holds [`Job`], [`Rule`] and the one-method [`Render`] trait.
//! - [`compose`] builds composite jobs ([`chain`], [`wrap`]).
//! - [`steps`] has the builder functions for `sdmflow`'s own helper steps.

pub mod compose;
pub mod model;
pub mod steps;

pub use compose::{chain, wrap};
pub use model::{Invocation, Job, LOCAL_MARKER, Locality, Render, Rule, SEQUENCE_SEPARATOR};
pub use steps::Toolbox;
