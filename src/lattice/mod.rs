//! The refinement lattice: parsing a formula into a DAG of refined sub-formulas,
//! and the pruning/search operations classifier strategies run over it.

pub mod graph;
pub mod node;
pub mod parser;

pub use graph::PhiGraph;
pub use node::{NodeId, PhiNode, Witness};
pub use parser::{DepthSpec, Parser};
