//! An introspectable syntax tree for Signal Temporal Logic (STL) formulae and the
//! operations needed to build and refine it.
//!
//! Unlike the HCTL tree this crate is descended from, an STL formula carries no
//! quantifiers or variables binding states of a transition system: its leaves are
//! numeric predicates over a signal, and its temporal operators (`always` /
//! `eventually`) are bounded by a real-valued time interval whose endpoints may
//! themselves be symbolic (to be resolved later by parameter synthesis).

use std::cmp;
use std::fmt;

/// Either a concrete numeric interval endpoint or a symbolic name to be resolved
/// later by [crate::synthesis].
#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
    Const(f64),
    Symbol(String),
}

impl Bound {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Bound::Const(_) => None,
            Bound::Symbol(name) => Some(name.as_str()),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bound::Const(v) => write!(f, "{v}"),
            Bound::Symbol(name) => write!(f, "{name}"),
        }
    }
}

/// Comparison operator used by a predicate leaf.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PredicateOp {
    Lt,
    Gt,
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PredicateOp::Lt => write!(f, "<"),
            PredicateOp::Gt => write!(f, ">"),
        }
    }
}

/// Enum of possible node data types in an STL formula syntax tree.
///
/// A node type is one of:
///     - A `Predicate`, a leaf comparing a named signal column against a threshold.
///     - `True` / `False`, the Boolean constants.
///     - `Not`, `And`, `Or`, the usual Boolean connectives.
///     - `Always` / `Eventually`, bounded temporal operators over `(lo, hi)`.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    Predicate {
        name: String,
        op: PredicateOp,
        threshold: f64,
        signal_index: usize,
    },
    True,
    False,
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Always(Box<Formula>, Bound, Bound),
    Eventually(Box<Formula>, Bound, Bound),
}

/// A single node in an STL formula syntax tree.
///
/// Each node carries a canonical string `id`, built once at construction time, which
/// is used as the node's semantic identity throughout the lattice parser and graph:
/// two formulas with the same `id` are treated as the same refined formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    pub id: String,
    pub node_type: NodeType,
}

impl Formula {
    /// Create a predicate leaf `name op threshold`, reading column `signal_index` of the trace.
    pub fn predicate(name: &str, op: PredicateOp, threshold: f64, signal_index: usize) -> Formula {
        Formula {
            id: format!("{name}_{op}_{threshold}"),
            node_type: NodeType::Predicate {
                name: name.to_string(),
                op,
                threshold,
                signal_index,
            },
        }
    }

    pub fn mk_true() -> Formula {
        Formula {
            id: "TRUE".to_string(),
            node_type: NodeType::True,
        }
    }

    pub fn mk_false() -> Formula {
        Formula {
            id: "FALSE".to_string(),
            node_type: NodeType::False,
        }
    }

    /// Negate `child`, rewriting to negation-normal form at construction time rather
    /// than introducing a bare `Not` node over a constant or another `Not`.
    pub fn mk_not(child: Formula) -> Formula {
        match child.node_type {
            NodeType::True => Formula::mk_false(),
            NodeType::False => Formula::mk_true(),
            NodeType::Not(inner) => *inner,
            _ => Formula {
                id: format!("neg_{}", child.id),
                node_type: NodeType::Not(Box::new(child)),
            },
        }
    }

    pub fn mk_and(left: Formula, right: Formula) -> Formula {
        Formula {
            id: format!("and__{}__{}", left.id, right.id),
            node_type: NodeType::And(Box::new(left), Box::new(right)),
        }
    }

    pub fn mk_or(left: Formula, right: Formula) -> Formula {
        Formula {
            id: format!("or__{}__{}", left.id, right.id),
            node_type: NodeType::Or(Box::new(left), Box::new(right)),
        }
    }

    pub fn mk_always(child: Formula, lo: Bound, hi: Bound) -> Formula {
        Formula {
            id: format!("alw_[{lo},{hi}]__{}", child.id),
            node_type: NodeType::Always(Box::new(child), lo, hi),
        }
    }

    pub fn mk_eventually(child: Formula, lo: Bound, hi: Bound) -> Formula {
        Formula {
            id: format!("ev_[{lo},{hi}]__{}", child.id),
            node_type: NodeType::Eventually(Box::new(child), lo, hi),
        }
    }

    // --- Explicit-id constructors used only by the lattice parser ---
    //
    // The parser builds many structurally-similar candidate formulas while
    // tracking their raw identity strings itself (mirroring the original
    // algorithm's id bookkeeping); it needs full control over the id rather
    // than the content-addressed ids the `mk_*` factories compute.

    pub(crate) fn raw(id: String, node_type: NodeType) -> Formula {
        Formula { id, node_type }
    }

    pub(crate) fn raw_not(child: Formula, id: String) -> Formula {
        Formula::raw(id, NodeType::Not(Box::new(child)))
    }

    pub(crate) fn raw_and(left: Formula, right: Formula, id: String) -> Formula {
        Formula::raw(id, NodeType::And(Box::new(left), Box::new(right)))
    }

    pub(crate) fn raw_or(left: Formula, right: Formula, id: String) -> Formula {
        Formula::raw(id, NodeType::Or(Box::new(left), Box::new(right)))
    }

    pub(crate) fn raw_always(child: Formula, lo: Bound, hi: Bound, id: String) -> Formula {
        Formula::raw(id, NodeType::Always(Box::new(child), lo, hi))
    }

    pub(crate) fn raw_eventually(child: Formula, lo: Bound, hi: Bound, id: String) -> Formula {
        Formula::raw(id, NodeType::Eventually(Box::new(child), lo, hi))
    }

    /// Fold a non-empty list of formulas into a right-leaning chain of `and`.
    /// Kept out of the core constructor set (see `DESIGN.md`); used only by demo fixtures.
    pub fn and_all(mut children: Vec<Formula>) -> Formula {
        if children.is_empty() {
            return Formula::mk_true();
        }
        let mut result = children.remove(0);
        for child in children {
            result = Formula::mk_and(result, child);
        }
        result
    }

    /// Fold a non-empty list of formulas into a right-leaning chain of `or`.
    pub fn or_all(mut children: Vec<Formula>) -> Formula {
        if children.is_empty() {
            return Formula::mk_false();
        }
        let mut result = children.remove(0);
        for child in children {
            result = Formula::mk_or(result, child);
        }
        result
    }

    /// Height of the tree, counting the root as 0 (used only for diagnostics/tests).
    pub fn height(&self) -> u32 {
        match &self.node_type {
            NodeType::Predicate { .. } | NodeType::True | NodeType::False => 0,
            NodeType::Not(child) => child.height() + 1,
            NodeType::And(l, r) | NodeType::Or(l, r) => cmp::max(l.height(), r.height()) + 1,
            NodeType::Always(child, ..) | NodeType::Eventually(child, ..) => child.height() + 1,
        }
    }

    /// Collect every distinct symbolic interval-bound name appearing in this subtree,
    /// in the order first encountered.
    pub fn get_param_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_param_names(&mut names);
        names
    }

    fn collect_param_names(&self, out: &mut Vec<String>) {
        match &self.node_type {
            NodeType::Predicate { .. } | NodeType::True | NodeType::False => {}
            NodeType::Not(child) => child.collect_param_names(out),
            NodeType::And(l, r) | NodeType::Or(l, r) => {
                l.collect_param_names(out);
                r.collect_param_names(out);
            }
            NodeType::Always(child, lo, hi) | NodeType::Eventually(child, lo, hi) => {
                for bound in [lo, hi] {
                    if let Bound::Symbol(name) = bound {
                        if !out.contains(name) {
                            out.push(name.clone());
                        }
                    }
                }
                child.collect_param_names(out);
            }
        }
    }

    /// Map each symbolic bound name in this subtree to its numeric bounds, looked up
    /// in `interval_dict` (a mapping from symbolic name to the `(lo, hi)` range it was
    /// registered with during lattice parsing).
    pub fn get_param_bounds(
        &self,
        interval_dict: &std::collections::HashMap<String, (f64, f64)>,
    ) -> std::collections::HashMap<String, (f64, f64)> {
        let mut bounds = std::collections::HashMap::new();
        self.collect_param_bounds(interval_dict, &mut bounds);
        bounds
    }

    fn collect_param_bounds(
        &self,
        interval_dict: &std::collections::HashMap<String, (f64, f64)>,
        out: &mut std::collections::HashMap<String, (f64, f64)>,
    ) {
        match &self.node_type {
            NodeType::Predicate { .. } | NodeType::True | NodeType::False => {}
            NodeType::Not(child) => child.collect_param_bounds(interval_dict, out),
            NodeType::And(l, r) | NodeType::Or(l, r) => {
                l.collect_param_bounds(interval_dict, out);
                r.collect_param_bounds(interval_dict, out);
            }
            NodeType::Always(child, lo, hi) | NodeType::Eventually(child, lo, hi) => {
                for bound in [lo, hi] {
                    if let Bound::Symbol(name) = bound {
                        if let Some(range) = interval_dict.get(name) {
                            out.insert(name.clone(), *range);
                        }
                    }
                }
                child.collect_param_bounds(interval_dict, out);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.node_type {
            NodeType::Predicate {
                name,
                op,
                threshold,
                ..
            } => write!(f, "{name} {op} {threshold}"),
            NodeType::True => write!(f, "TRUE"),
            NodeType::False => write!(f, "FALSE"),
            NodeType::Not(child) => write!(f, "not({child})"),
            NodeType::And(l, r) => write!(f, "({l}) and ({r})"),
            NodeType::Or(l, r) => write!(f, "({l}) or ({r})"),
            NodeType::Always(child, lo, hi) => write!(f, "alw_[{lo},{hi}]({child})"),
            NodeType::Eventually(child, lo, hi) => write!(f, "ev_[{lo},{hi}]({child})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_collapses_constants_and_double_negation() {
        assert_eq!(Formula::mk_not(Formula::mk_true()), Formula::mk_false());
        assert_eq!(Formula::mk_not(Formula::mk_false()), Formula::mk_true());
        let p = Formula::predicate("x", PredicateOp::Lt, 1.0, 0);
        let double = Formula::mk_not(Formula::mk_not(p.clone()));
        assert_eq!(double, p);
    }

    #[test]
    fn param_names_are_deduplicated_and_ordered() {
        let p = Formula::predicate("x", PredicateOp::Lt, 1.0, 0);
        let inner = Formula::mk_always(
            p.clone(),
            Bound::Symbol("t2".to_string()),
            Bound::Const(5.0),
        );
        let outer = Formula::mk_eventually(
            inner,
            Bound::Const(0.0),
            Bound::Symbol("t2".to_string()),
        );
        assert_eq!(outer.get_param_names(), vec!["t2".to_string()]);
    }

    #[test]
    fn display_matches_expected_shape() {
        let p = Formula::predicate("speed", PredicateOp::Gt, 10.0, 2);
        let alw = Formula::mk_always(p, Bound::Const(0.0), Bound::Const(4.0));
        assert_eq!(alw.to_string(), "alw_[0,4](speed > 10)");
    }
}
