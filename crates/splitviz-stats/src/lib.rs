#![forbid(unsafe_code)]

//! Incremental cross-tabulation over a lattice of splits.
//!
//! # Pipeline
//!
//! 1. [`Lattice::build`] enumerates every combination of grouping-question
//!    response groups (plus "no filter") and precomputes, per split, the
//!    basis splits it sums over.
//! 2. [`Validator`] decides which respondents count and with what weight.
//! 3. [`aggregate::update`] folds respondents into basis splits;
//!    [`aggregate::propagate`] rebuilds the aggregate splits that cover
//!    them.
//! 4. [`Statistics::apply`] drives 2–3 for a batch and reports diffs.
//! 5. [`sampler::allocate`] rounds proportions to exact integer counts.
//!
//! Everything here is synchronous and single-writer. Batches must be
//! serialized by the caller.

pub mod aggregate;
pub mod error;
pub mod lattice;
pub mod sampler;
pub mod split;
pub mod statistics;
pub mod validate;

pub use aggregate::RespondentDelta;
pub use error::{Result, StatsError};
pub use lattice::Lattice;
pub use split::{GroupDelta, GroupStats, ResponseDelta, ResponseStats, Split, SplitDiff};
pub use statistics::{Statistics, StatsSummary, UpdateResult};
pub use validate::{Rejection, ValidRespondent, Validator, Verdict};
