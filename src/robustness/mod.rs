//! Lowering of [crate::formula::Formula] trees into a small evaluable representation,
//! and the quantitative-semantics kernel that computes robustness over trace batches.

pub mod adapter;
pub mod kernel;

pub use adapter::lower;
pub use kernel::{robustness_batch, Expr, RobustnessKernel};
