//! STL counterexample-trace classification through lattice refinement.
//!
//! As of now, the library supports:
//!  - Building quantitative-robustness formula trees ([formula]) over signal predicates,
//!    Boolean connectives and interval-bounded temporal operators.
//!  - Refining a formula into a lattice of progressively more specific sub-formulae,
//!    reduced to its Hasse diagram ([lattice]).
//!  - Parameter synthesis for symbolic interval bounds via grid search or CMA-ES
//!    ([synthesis]).
//!  - Several lattice-traversal classification strategies sharing one node-test
//!    primitive ([strategies]).
//!  - Loading trace batches from native arrays, `.npy`/`.npz` or `.mat` files
//!    ([trace_loader]).

pub mod analysis;
pub mod formula;
pub mod generate_output;
pub mod lattice;
pub mod result_print;
pub mod robustness;
pub mod strategies;
pub mod synthesis;
pub mod trace_loader;
