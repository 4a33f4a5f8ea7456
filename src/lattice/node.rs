//! A single node in the refinement lattice.

use crate::formula::Formula;
use std::collections::HashMap;

/// Index of a [PhiNode] within a [crate::lattice::graph::PhiGraph]'s arena. Lattice
/// nodes reference each other by this stable index rather than by `Rc<RefCell<_>>`
/// handles, so pruning flips a bit in one arena slot without touching anything else.
pub type NodeId = usize;

/// A witnessing counterexample: the trace and parameter binding that proved a node's
/// formula falsifiable, plus the objective value synthesis found for it.
#[derive(Clone, Debug)]
pub struct Witness {
    pub trace_index: usize,
    pub params: HashMap<String, f64>,
    pub objective: f64,
}

/// Node in the refinement lattice (formula graph).
///
/// Each node represents a refined STL formula. An edge represents logical
/// implication: if a node in `greater_all` holds, then this node must also hold.
#[derive(Clone, Debug)]
pub struct PhiNode {
    pub formula: Formula,
    pub greater_all: Vec<NodeId>,
    pub smaller_all: Vec<NodeId>,
    pub greater_imme: Vec<NodeId>,
    pub smaller_imme: Vec<NodeId>,
    pub active: bool,
    pub witnesses: Vec<Witness>,
}

impl PhiNode {
    pub fn new(formula: Formula) -> PhiNode {
        PhiNode {
            formula,
            greater_all: Vec::new(),
            smaller_all: Vec::new(),
            greater_imme: Vec::new(),
            smaller_imme: Vec::new(),
            active: true,
            witnesses: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.formula.id
    }
}
