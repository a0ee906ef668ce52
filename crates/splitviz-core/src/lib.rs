#![forbid(unsafe_code)]

//! Core: question model, session/visualization configuration, and geometry.
//!
//! # Role in splitviz
//! `splitviz-core` is the vocabulary layer. It owns the question identity
//! triple, response-group partitions, raw respondent records, the two
//! configuration documents, and the floating-point geometry primitives the
//! layout engine emits.
//!
//! # Primary responsibilities
//! - **Question / ResponseGroup**: immutable keys and value buckets.
//! - **ResponseQuestion**: expanded/collapsed partitions with a precomputed
//!   expanded→collapsed lookup table.
//! - **SessionConfig / VizConfig**: serde-backed configuration with
//!   construction-time validation.
//! - **Bounds / Position**: canvas-space rectangles and points.
//!
//! # How it fits in the system
//! `splitviz-stats` consumes the question model to build the split lattice
//! and validate respondents; `splitviz-layout` consumes `VizConfig` and the
//! geometry types to place segments and points.

pub mod config;
pub mod error;
pub mod geometry;
pub mod question;
pub mod respondent;

pub use config::{SessionConfig, VizConfig};
pub use error::{ConfigError, Result};
pub use geometry::{Bounds, Position};
pub use question::{Granularity, GroupingQuestion, Question, ResponseGroup, ResponseQuestion};
pub use respondent::{RawValue, Respondent};
