//! Parses an STL formula into a refinement lattice ([PhiGraph]).
//!
//! Takes the formula and a depth configuration, generates every refined sub-formula
//! reachable by splitting temporal intervals and simplifying boolean structure,
//! builds the implication edges between them, deduplicates by simplified identifier,
//! and reduces the transitive closure to its Hasse diagram.

use crate::formula::{Bound, Formula, NodeType};
use crate::lattice::graph::PhiGraph;
use crate::lattice::node::PhiNode;
use log::debug;
use std::collections::HashMap;

/// Depth configuration mirroring the shape of the formula tree being refined.
///
/// For a temporal node, `k0` is the number of segments its interval is split into.
/// The shape of a [DepthSpec] must mirror the shape of the formula it is parsed
/// against; a mismatch is reported as a malformed-input error.
#[derive(Clone, Debug)]
pub enum DepthSpec {
    Leaf,
    Not(Box<DepthSpec>),
    Binary(Box<DepthSpec>, Box<DepthSpec>),
    Temporal(usize, Box<DepthSpec>),
}

struct Edge {
    greater: String,
    smaller: String,
}

pub struct Parser {
    formula: Formula,
    depth: DepthSpec,
    simplify_dict: HashMap<String, String>,
    formula_dict: HashMap<String, Formula>,
    interval_dict: HashMap<String, (f64, f64)>,
}

impl Parser {
    pub fn new(formula: Formula, depth: DepthSpec) -> Parser {
        Parser {
            formula,
            depth,
            simplify_dict: HashMap::new(),
            formula_dict: HashMap::new(),
            interval_dict: HashMap::new(),
        }
    }

    /// Run the full parsing pipeline, returning the constructed lattice together
    /// with the symbolic interval bounds discovered while splitting temporal nodes.
    pub fn parse(mut self) -> Result<(PhiGraph, HashMap<String, (f64, f64)>), String> {
        let formula = self.formula.clone();
        let depth = self.depth.clone();

        let raw_nodes = self.parse_nodes_neg(&formula, &depth)?;

        let mut simp_phis: Vec<PhiNode> = Vec::new();
        let mut simp_index: HashMap<String, usize> = HashMap::new();
        for raw in &raw_nodes {
            let simp_id = self
                .simplify_dict
                .get(&raw.id)
                .ok_or_else(|| format!("no simplified form recorded for '{}'", raw.id))?
                .clone();
            if !simp_index.contains_key(&simp_id) {
                let formula = self
                    .formula_dict
                    .get(&simp_id)
                    .ok_or_else(|| format!("no canonical formula recorded for '{simp_id}'"))?
                    .clone();
                simp_index.insert(simp_id, simp_phis.len());
                simp_phis.push(PhiNode::new(formula));
            }
        }

        let edges = self.parse_edges_neg(&formula, &depth)?;
        for edge in edges {
            let Some(greater_simp) = self.simplify_dict.get(&edge.greater) else {
                continue;
            };
            let Some(smaller_simp) = self.simplify_dict.get(&edge.smaller) else {
                continue;
            };
            let (Some(&gi), Some(&si)) =
                (simp_index.get(greater_simp), simp_index.get(smaller_simp))
            else {
                continue;
            };
            if gi != si {
                if !simp_phis[gi].smaller_all.contains(&si) {
                    simp_phis[gi].smaller_all.push(si);
                }
                if !simp_phis[si].greater_all.contains(&gi) {
                    simp_phis[si].greater_all.push(gi);
                }
            }
        }

        debug!(
            "parser dedup: {} raw nodes -> {} simplified nodes",
            raw_nodes.len(),
            simp_phis.len()
        );
        Ok((PhiGraph::new(simp_phis), self.interval_dict))
    }

    /// Numeric bounds for every symbolic interval name appearing in `formula`.
    pub fn param_bounds_for(&self, formula: &Formula) -> HashMap<String, (f64, f64)> {
        formula.get_param_bounds(&self.interval_dict)
    }

    // ===================================================================
    // Node generation
    // ===================================================================

    fn parse_nodes_pos(&mut self, phi: &Formula, depth: &DepthSpec) -> Result<Vec<Formula>, String> {
        match (&phi.node_type, depth) {
            (NodeType::Predicate { .. }, _) => self.parse_predicate_pos(phi),
            (NodeType::True, _) | (NodeType::False, _) => {
                Err("TRUE/FALSE cannot appear as a refinable node".to_string())
            }
            (NodeType::Not(child), DepthSpec::Not(d)) => self.parse_not_pos(phi, child, d),
            (NodeType::And(l, r), DepthSpec::Binary(dl, dr)) => {
                self.parse_binary_pos(l, r, dl, dr, "PosAnd", true)
            }
            (NodeType::Or(l, r), DepthSpec::Binary(dl, dr)) => {
                self.parse_binary_pos(l, r, dl, dr, "PosOr", false)
            }
            (NodeType::Always(child, lo, hi), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_pos(&phi.id, child, lo, hi, *k0, d, true)
            }
            (NodeType::Eventually(child, lo, hi), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_pos(&phi.id, child, lo, hi, *k0, d, false)
            }
            _ => Err(format!("depth spec shape does not match formula at '{}'", phi.id)),
        }
    }

    fn parse_nodes_neg(&mut self, phi: &Formula, depth: &DepthSpec) -> Result<Vec<Formula>, String> {
        match (&phi.node_type, depth) {
            (NodeType::Predicate { .. }, _) => self.parse_predicate_neg(phi),
            (NodeType::True, _) | (NodeType::False, _) => {
                Err("TRUE/FALSE cannot appear as a refinable node".to_string())
            }
            (NodeType::Not(child), DepthSpec::Not(d)) => self.parse_not_neg(phi, child, d),
            (NodeType::And(l, r), DepthSpec::Binary(dl, dr)) => {
                self.parse_binary_neg(l, r, dl, dr, "NegAnd", true)
            }
            (NodeType::Or(l, r), DepthSpec::Binary(dl, dr)) => {
                self.parse_binary_neg(l, r, dl, dr, "NegOr", false)
            }
            (NodeType::Always(child, lo, hi), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_neg(&phi.id, child, lo, hi, *k0, d, true)
            }
            (NodeType::Eventually(child, lo, hi), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_neg(&phi.id, child, lo, hi, *k0, d, false)
            }
            _ => Err(format!("depth spec shape does not match formula at '{}'", phi.id)),
        }
    }

    fn parse_predicate_pos(&mut self, phi: &Formula) -> Result<Vec<Formula>, String> {
        self.simplify_dict.insert(phi.id.clone(), phi.id.clone());
        self.formula_dict.insert(phi.id.clone(), phi.clone());
        let f_node = Formula::mk_false();
        self.simplify_dict.insert("FALSE".to_string(), "FALSE".to_string());
        self.formula_dict.insert("FALSE".to_string(), f_node.clone());
        Ok(vec![phi.clone(), f_node])
    }

    fn parse_predicate_neg(&mut self, phi: &Formula) -> Result<Vec<Formula>, String> {
        self.simplify_dict.insert(phi.id.clone(), phi.id.clone());
        self.formula_dict.insert(phi.id.clone(), phi.clone());
        let t_node = Formula::mk_true();
        self.simplify_dict.insert("TRUE".to_string(), "TRUE".to_string());
        self.formula_dict.insert("TRUE".to_string(), t_node.clone());
        Ok(vec![phi.clone(), t_node])
    }

    fn parse_not_pos(
        &mut self,
        _phi: &Formula,
        child: &Formula,
        depth: &DepthSpec,
    ) -> Result<Vec<Formula>, String> {
        self.parse_not_generic(child, depth, "PosNot_", false)
    }

    fn parse_not_neg(
        &mut self,
        _phi: &Formula,
        child: &Formula,
        depth: &DepthSpec,
    ) -> Result<Vec<Formula>, String> {
        self.parse_not_generic(child, depth, "NegNot_", true)
    }

    /// `not` flips polarity for its child: the positive-context `not` recurses into
    /// the child under negative polarity and vice versa.
    fn parse_not_generic(
        &mut self,
        child: &Formula,
        depth: &DepthSpec,
        prefix: &str,
        child_is_pos: bool,
    ) -> Result<Vec<Formula>, String> {
        let child_nodes = if child_is_pos {
            self.parse_nodes_pos(child, depth)?
        } else {
            self.parse_nodes_neg(child, depth)?
        };
        let mut result = Vec::with_capacity(child_nodes.len());
        for p in child_nodes {
            let new_id = format!("{prefix}{}", p.id);
            let new_formula = Formula::raw_not(p.clone(), new_id.clone());

            let p_simp_id = self
                .simplify_dict
                .get(&p.id)
                .ok_or_else(|| format!("no simplified form recorded for '{}'", p.id))?
                .clone();
            let simplified_id = if p_simp_id == "FALSE" {
                self.formula_dict.insert("TRUE".to_string(), Formula::mk_true());
                "TRUE".to_string()
            } else if p_simp_id == "TRUE" {
                self.formula_dict.insert("FALSE".to_string(), Formula::mk_false());
                "FALSE".to_string()
            } else {
                let sid = format!("{prefix}{p_simp_id}");
                let inner = self
                    .formula_dict
                    .get(&p_simp_id)
                    .ok_or_else(|| format!("no canonical formula recorded for '{p_simp_id}'"))?
                    .clone();
                self.formula_dict.insert(sid.clone(), Formula::raw_not(inner, sid.clone()));
                sid
            };
            self.simplify_dict.insert(new_id, simplified_id);
            result.push(new_formula);
        }
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_binary_pos(
        &mut self,
        left: &Formula,
        right: &Formula,
        dl: &DepthSpec,
        dr: &DepthSpec,
        prefix: &str,
        is_and: bool,
    ) -> Result<Vec<Formula>, String> {
        let nodes1 = self.parse_nodes_pos(left, dl)?;
        let nodes2 = self.parse_nodes_pos(right, dr)?;
        self.combine_binary(prefix, is_and, &nodes1, &nodes2)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_binary_neg(
        &mut self,
        left: &Formula,
        right: &Formula,
        dl: &DepthSpec,
        dr: &DepthSpec,
        prefix: &str,
        is_and: bool,
    ) -> Result<Vec<Formula>, String> {
        let nodes1 = self.parse_nodes_neg(left, dl)?;
        let nodes2 = self.parse_nodes_neg(right, dr)?;
        self.combine_binary(prefix, is_and, &nodes1, &nodes2)
    }

    fn combine_binary(
        &mut self,
        prefix: &str,
        is_and: bool,
        nodes1: &[Formula],
        nodes2: &[Formula],
    ) -> Result<Vec<Formula>, String> {
        let mut result = Vec::with_capacity(nodes1.len() * nodes2.len());
        for p1 in nodes1 {
            for p2 in nodes2 {
                let new_id = format!("{prefix}_{}{}", p1.id, p2.id);
                let new_formula = if is_and {
                    Formula::raw_and(p1.clone(), p2.clone(), new_id.clone())
                } else {
                    Formula::raw_or(p1.clone(), p2.clone(), new_id.clone())
                };
                result.push(new_formula);

                let p1_simp = self
                    .simplify_dict
                    .get(&p1.id)
                    .ok_or_else(|| format!("no simplified form recorded for '{}'", p1.id))?
                    .clone();
                let p2_simp = self
                    .simplify_dict
                    .get(&p2.id)
                    .ok_or_else(|| format!("no simplified form recorded for '{}'", p2.id))?
                    .clone();

                let (simplified_id, simp_formula) = if is_and {
                    self.simplify_and(&p1_simp, &p2_simp, prefix)?
                } else {
                    self.simplify_or(&p1_simp, &p2_simp, prefix)?
                };
                self.simplify_dict.insert(new_id, simplified_id.clone());
                self.formula_dict.insert(simplified_id, simp_formula);
            }
        }
        Ok(result)
    }

    fn simplify_and(
        &self,
        p1_simp: &str,
        p2_simp: &str,
        prefix: &str,
    ) -> Result<(String, Formula), String> {
        if p1_simp == "FALSE" || p2_simp == "FALSE" {
            Ok(("FALSE".to_string(), Formula::mk_false()))
        } else if p1_simp == "TRUE" && p2_simp == "TRUE" {
            Ok(("TRUE".to_string(), Formula::mk_true()))
        } else if p1_simp == "TRUE" {
            Ok((p2_simp.to_string(), self.lookup_formula(p2_simp)?))
        } else if p2_simp == "TRUE" {
            Ok((p1_simp.to_string(), self.lookup_formula(p1_simp)?))
        } else {
            let sid = format!("{prefix}_{p1_simp}{p2_simp}");
            let formula =
                Formula::raw_and(self.lookup_formula(p1_simp)?, self.lookup_formula(p2_simp)?, sid.clone());
            Ok((sid, formula))
        }
    }

    fn simplify_or(
        &self,
        p1_simp: &str,
        p2_simp: &str,
        prefix: &str,
    ) -> Result<(String, Formula), String> {
        if p1_simp == "TRUE" || p2_simp == "TRUE" {
            Ok(("TRUE".to_string(), Formula::mk_true()))
        } else if p1_simp == "FALSE" && p2_simp == "FALSE" {
            Ok(("FALSE".to_string(), Formula::mk_false()))
        } else if p1_simp == "FALSE" {
            Ok((p2_simp.to_string(), self.lookup_formula(p2_simp)?))
        } else if p2_simp == "FALSE" {
            Ok((p1_simp.to_string(), self.lookup_formula(p1_simp)?))
        } else {
            let sid = format!("{prefix}_{p1_simp}{p2_simp}");
            let formula =
                Formula::raw_or(self.lookup_formula(p1_simp)?, self.lookup_formula(p2_simp)?, sid.clone());
            Ok((sid, formula))
        }
    }

    fn lookup_formula(&self, id: &str) -> Result<Formula, String> {
        self.formula_dict
            .get(id)
            .cloned()
            .ok_or_else(|| format!("no canonical formula recorded for '{id}'"))
    }

    // ===================================================================
    // Temporal operators
    // ===================================================================

    #[allow(clippy::too_many_arguments)]
    fn parse_temporal_pos(
        &mut self,
        phi_id: &str,
        child: &Formula,
        lo: &Bound,
        hi: &Bound,
        k0: usize,
        depth: &DepthSpec,
        is_always: bool,
    ) -> Result<Vec<Formula>, String> {
        let child_nodes = self.parse_nodes_pos(child, depth)?;
        self.register_top_interval(phi_id, lo, hi);
        let queue = cartesian_power(&child_nodes, k0);
        if is_always {
            self.build_always_nodes(queue, phi_id, lo, hi, "Pos")
        } else {
            self.build_eventually_nodes(queue, phi_id, lo, hi, "Pos")
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_temporal_neg(
        &mut self,
        phi_id: &str,
        child: &Formula,
        lo: &Bound,
        hi: &Bound,
        k0: usize,
        depth: &DepthSpec,
        is_always: bool,
    ) -> Result<Vec<Formula>, String> {
        let child_nodes = self.parse_nodes_neg(child, depth)?;
        self.register_top_interval(phi_id, lo, hi);
        let queue = cartesian_power(&child_nodes, k0);
        if is_always {
            self.build_always_nodes(queue, phi_id, lo, hi, "Neg")
        } else {
            self.build_eventually_nodes(queue, phi_id, lo, hi, "Neg")
        }
    }

    fn register_top_interval(&mut self, phi_id: &str, lo: &Bound, hi: &Bound) {
        if let (Bound::Const(a), Bound::Const(b)) = (lo, hi) {
            self.interval_dict.insert(format!("{phi_id}____"), (*a, *b));
        }
    }

    fn register_param_bound(&mut self, param_name: &str, phi_id: &str, lo: &Bound, hi: &Bound) {
        let base_key = format!("{phi_id}____");
        if let Some(bounds) = self.interval_dict.get(&base_key).copied() {
            self.interval_dict.insert(param_name.to_string(), bounds);
        } else if let (Bound::Const(a), Bound::Const(b)) = (lo, hi) {
            self.interval_dict.insert(param_name.to_string(), (*a, *b));
        }
    }

    fn segment_bounds(&mut self, phi_id: &str, lo: &Bound, hi: &Bound, j: usize, col_size: usize) -> (Bound, Bound) {
        let tst = if j == 0 {
            lo.clone()
        } else {
            Bound::Symbol(format!("{phi_id}____t{}", j + 1))
        };
        let ted = if j == col_size - 1 {
            hi.clone()
        } else {
            Bound::Symbol(format!("{phi_id}____t{}", j + 2))
        };
        if let Bound::Symbol(name) = &tst {
            if !self.interval_dict.contains_key(name) {
                self.register_param_bound(name, phi_id, lo, hi);
            }
        }
        if let Bound::Symbol(name) = &ted {
            if !self.interval_dict.contains_key(name) {
                self.register_param_bound(name, phi_id, lo, hi);
            }
        }
        (tst, ted)
    }

    fn build_always_nodes(
        &mut self,
        queue: Vec<Vec<Formula>>,
        phi_id: &str,
        lo: &Bound,
        hi: &Bound,
        polarity: &str,
    ) -> Result<Vec<Formula>, String> {
        let mut result = Vec::with_capacity(queue.len());
        let col_size = queue.first().map(|row| row.len()).unwrap_or(0);

        for row in queue {
            let mut full_id = format!("{polarity}Alw_");
            let mut simp_id = format!("{polarity}Alw_");
            let mut simp_fixed_false = false;
            let mut simp_exist_nontrue = false;
            let mut phi_set = Vec::with_capacity(row.len());
            let mut simp_phi_set = Vec::new();

            for (j, p) in row.iter().enumerate() {
                let p_simp_id = self
                    .simplify_dict
                    .get(&p.id)
                    .ok_or_else(|| format!("no simplified form recorded for '{}'", p.id))?
                    .clone();
                if p_simp_id == "FALSE" {
                    simp_fixed_false = true;
                } else if p_simp_id != "TRUE" {
                    simp_exist_nontrue = true;
                }

                let (tst, ted) = self.segment_bounds(phi_id, lo, hi, j, col_size);

                full_id.push_str(&p.id);
                phi_set.push(Formula::raw_always(p.clone(), tst.clone(), ted.clone(), format!("Alw{}", p.id)));

                if p_simp_id != "TRUE" && p_simp_id != "FALSE" {
                    if j == 0 {
                        simp_id.push_str(&format!("st{p_simp_id}"));
                    } else if j == col_size - 1 {
                        simp_id.push_str(&format!("ed{p_simp_id}"));
                    } else {
                        simp_id.push_str(&p_simp_id);
                    }
                    let inner = self.lookup_formula(&p_simp_id)?;
                    simp_phi_set.push(Formula::raw_always(inner, tst, ted, format!("Alw{p_simp_id}")));
                }
            }

            let full_formula = chain_and(phi_set, &full_id);
            result.push(full_formula);

            let simplified_id = if simp_fixed_false {
                self.formula_dict.insert("FALSE".to_string(), Formula::mk_false());
                "FALSE".to_string()
            } else if !simp_exist_nontrue {
                self.formula_dict.insert("TRUE".to_string(), Formula::mk_true());
                "TRUE".to_string()
            } else {
                let simp_formula = chain_and(simp_phi_set, &simp_id);
                self.formula_dict.insert(simp_id.clone(), simp_formula);
                simp_id
            };
            self.simplify_dict.insert(full_id, simplified_id);
        }

        Ok(result)
    }

    fn build_eventually_nodes(
        &mut self,
        queue: Vec<Vec<Formula>>,
        phi_id: &str,
        lo: &Bound,
        hi: &Bound,
        polarity: &str,
    ) -> Result<Vec<Formula>, String> {
        let mut result = Vec::with_capacity(queue.len());
        let col_size = queue.first().map(|row| row.len()).unwrap_or(0);

        for row in queue {
            let mut full_id = format!("{polarity}Ev_");
            let mut simp_id = format!("{polarity}Ev_");
            let mut simp_fixed_true = false;
            let mut simp_exist_nonfalse = false;
            let mut phi_set = Vec::with_capacity(row.len());
            let mut simp_phi_set = Vec::new();

            for (j, p) in row.iter().enumerate() {
                let p_simp_id = self
                    .simplify_dict
                    .get(&p.id)
                    .ok_or_else(|| format!("no simplified form recorded for '{}'", p.id))?
                    .clone();
                if p_simp_id == "TRUE" {
                    simp_fixed_true = true;
                } else if p_simp_id != "FALSE" {
                    simp_exist_nonfalse = true;
                }

                let (tst, ted) = self.segment_bounds(phi_id, lo, hi, j, col_size);

                full_id.push_str(&p.id);
                phi_set.push(Formula::raw_eventually(p.clone(), tst.clone(), ted.clone(), format!("Ev{}", p.id)));

                if p_simp_id != "TRUE" && p_simp_id != "FALSE" {
                    if j == 0 {
                        simp_id.push_str(&format!("st{p_simp_id}"));
                    } else if j == col_size - 1 {
                        simp_id.push_str(&format!("ed{p_simp_id}"));
                    } else {
                        simp_id.push_str(&p_simp_id);
                    }
                    let inner = self.lookup_formula(&p_simp_id)?;
                    simp_phi_set.push(Formula::raw_eventually(inner, tst, ted, format!("Ev{p_simp_id}")));
                }
            }

            let full_formula = chain_or(phi_set, &full_id);
            result.push(full_formula);

            let simplified_id = if simp_fixed_true {
                self.formula_dict.insert("TRUE".to_string(), Formula::mk_true());
                "TRUE".to_string()
            } else if !simp_exist_nonfalse {
                self.formula_dict.insert("FALSE".to_string(), Formula::mk_false());
                "FALSE".to_string()
            } else {
                let simp_formula = chain_or(simp_phi_set, &simp_id);
                self.formula_dict.insert(simp_id.clone(), simp_formula);
                simp_id
            };
            self.simplify_dict.insert(full_id, simplified_id);
        }

        Ok(result)
    }

    // ===================================================================
    // Edge generation
    // ===================================================================

    fn parse_edges_pos(&mut self, phi: &Formula, depth: &DepthSpec) -> Result<Vec<Edge>, String> {
        match (&phi.node_type, depth) {
            (NodeType::Predicate { .. }, _) => {
                let pid = phi.id.clone();
                Ok(vec![
                    Edge { greater: pid.clone(), smaller: pid.clone() },
                    Edge { greater: pid, smaller: "FALSE".to_string() },
                    Edge { greater: "FALSE".to_string(), smaller: "FALSE".to_string() },
                ])
            }
            (NodeType::Not(child), DepthSpec::Not(d)) => {
                let child_edges = self.parse_edges_neg(child, d)?;
                Ok(child_edges
                    .into_iter()
                    .map(|e| Edge {
                        greater: format!("PosNot_{}", e.greater),
                        smaller: format!("PosNot_{}", e.smaller),
                    })
                    .collect())
            }
            (NodeType::And(l, r), DepthSpec::Binary(dl, dr)) => {
                self.combine_binary_edges_pos(l, r, dl, dr, "PosAnd")
            }
            (NodeType::Or(l, r), DepthSpec::Binary(dl, dr)) => {
                self.combine_binary_edges_pos(l, r, dl, dr, "PosOr")
            }
            (NodeType::Always(child, _, _), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_edges(child, *k0, d, "PosAlw", true)
            }
            (NodeType::Eventually(child, _, _), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_edges(child, *k0, d, "PosEv", true)
            }
            _ => Ok(Vec::new()),
        }
    }

    fn parse_edges_neg(&mut self, phi: &Formula, depth: &DepthSpec) -> Result<Vec<Edge>, String> {
        match (&phi.node_type, depth) {
            (NodeType::Predicate { .. }, _) => {
                let pid = phi.id.clone();
                Ok(vec![
                    Edge { greater: pid.clone(), smaller: pid.clone() },
                    Edge { greater: pid, smaller: "TRUE".to_string() },
                    Edge { greater: "TRUE".to_string(), smaller: "TRUE".to_string() },
                ])
            }
            (NodeType::Not(child), DepthSpec::Not(d)) => {
                let child_edges = self.parse_edges_pos(child, d)?;
                Ok(child_edges
                    .into_iter()
                    .map(|e| Edge {
                        greater: format!("NegNot_{}", e.greater),
                        smaller: format!("NegNot_{}", e.smaller),
                    })
                    .collect())
            }
            (NodeType::And(l, r), DepthSpec::Binary(dl, dr)) => {
                self.combine_binary_edges_neg(l, r, dl, dr, "NegAnd")
            }
            (NodeType::Or(l, r), DepthSpec::Binary(dl, dr)) => {
                self.combine_binary_edges_neg(l, r, dl, dr, "NegOr")
            }
            (NodeType::Always(child, _, _), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_edges(child, *k0, d, "NegAlw", false)
            }
            (NodeType::Eventually(child, _, _), DepthSpec::Temporal(k0, d)) => {
                self.parse_temporal_edges(child, *k0, d, "NegEv", false)
            }
            _ => Ok(Vec::new()),
        }
    }

    fn combine_binary_edges_pos(
        &mut self,
        left: &Formula,
        right: &Formula,
        dl: &DepthSpec,
        dr: &DepthSpec,
        prefix: &str,
    ) -> Result<Vec<Edge>, String> {
        let edges1 = self.parse_edges_pos(left, dl)?;
        let edges2 = self.parse_edges_pos(right, dr)?;
        Ok(cross_edges(prefix, &edges1, &edges2))
    }

    fn combine_binary_edges_neg(
        &mut self,
        left: &Formula,
        right: &Formula,
        dl: &DepthSpec,
        dr: &DepthSpec,
        prefix: &str,
    ) -> Result<Vec<Edge>, String> {
        let edges1 = self.parse_edges_neg(left, dl)?;
        let edges2 = self.parse_edges_neg(right, dr)?;
        Ok(cross_edges(prefix, &edges1, &edges2))
    }

    fn parse_temporal_edges(
        &mut self,
        child: &Formula,
        k0: usize,
        depth: &DepthSpec,
        prefix: &str,
        use_pos: bool,
    ) -> Result<Vec<Edge>, String> {
        let child_edges = if use_pos {
            self.parse_edges_pos(child, depth)?
        } else {
            self.parse_edges_neg(child, depth)?
        };
        let queue = cartesian_power_edges(&child_edges, k0);
        let mut result = Vec::with_capacity(queue.len());
        for row in queue {
            let mut id_1 = format!("{prefix}_");
            let mut id_2 = format!("{prefix}_");
            for edge in row {
                id_1.push_str(&edge.greater);
                id_2.push_str(&edge.smaller);
            }
            result.push(Edge { greater: id_1, smaller: id_2 });
        }
        Ok(result)
    }
}

fn cross_edges(prefix: &str, edges1: &[Edge], edges2: &[Edge]) -> Vec<Edge> {
    let mut out = Vec::with_capacity(edges1.len() * edges2.len());
    for e1 in edges1 {
        for e2 in edges2 {
            out.push(Edge {
                greater: format!("{prefix}_{}{}", e1.greater, e2.greater),
                smaller: format!("{prefix}_{}{}", e1.smaller, e2.smaller),
            });
        }
    }
    out
}

fn cartesian_power(items: &[Formula], k0: usize) -> Vec<Vec<Formula>> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut queue: Vec<Vec<Formula>> = items.iter().map(|f| vec![f.clone()]).collect();
    while queue[0].len() < k0 {
        let mut new_queue = Vec::with_capacity(queue.len() * items.len());
        for row in &queue {
            for item in items {
                let mut new_row = row.clone();
                new_row.push(item.clone());
                new_queue.push(new_row);
            }
        }
        queue = new_queue;
    }
    queue
}

fn cartesian_power_edges(items: &[Edge], k0: usize) -> Vec<Vec<&Edge>> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut queue: Vec<Vec<&Edge>> = items.iter().map(|e| vec![e]).collect();
    while queue[0].len() < k0 {
        let mut new_queue = Vec::with_capacity(queue.len() * items.len());
        for row in &queue {
            for item in items {
                let mut new_row = row.clone();
                new_row.push(item);
                new_queue.push(new_row);
            }
        }
        queue = new_queue;
    }
    queue
}

/// Chain a list of formulas into a binary `and` tree, giving the final (top) node
/// the requested `node_id`.
fn chain_and(mut nodes: Vec<Formula>, node_id: &str) -> Formula {
    let n = nodes.len();
    if n == 0 {
        return Formula::mk_true();
    }
    if n == 1 {
        let only = nodes.remove(0);
        return Formula::raw(node_id.to_string(), only.node_type);
    }
    let mut result = nodes.remove(0);
    let remaining = nodes;
    for (offset, next) in remaining.into_iter().enumerate() {
        let step = offset + 1;
        let mid_id = if step == n - 1 {
            node_id.to_string()
        } else {
            format!("{node_id}__p{step}")
        };
        result = Formula::raw_and(result, next, mid_id);
    }
    result
}

/// Chain a list of formulas into a binary `or` tree, giving the final (top) node
/// the requested `node_id`.
fn chain_or(mut nodes: Vec<Formula>, node_id: &str) -> Formula {
    let n = nodes.len();
    if n == 0 {
        return Formula::mk_false();
    }
    if n == 1 {
        let only = nodes.remove(0);
        return Formula::raw(node_id.to_string(), only.node_type);
    }
    let mut result = nodes.remove(0);
    let remaining = nodes;
    for (offset, next) in remaining.into_iter().enumerate() {
        let step = offset + 1;
        let mid_id = if step == n - 1 {
            node_id.to_string()
        } else {
            format!("{node_id}__p{step}")
        };
        result = Formula::raw_or(result, next, mid_id);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::PredicateOp;

    /// `always_[0,4](x < 1.0)` split into 2 segments should yield 3 refined formulas
    /// after deduplication: the full predicate-always, and the FALSE-degenerate case.
    fn at_formula() -> Formula {
        Formula::mk_always(
            Formula::predicate("x", PredicateOp::Lt, 1.0, 0),
            Bound::Const(0.0),
            Bound::Const(4.0),
        )
    }

    fn at_depth(segments: usize) -> DepthSpec {
        DepthSpec::Temporal(segments, Box::new(DepthSpec::Leaf))
    }

    #[test]
    fn single_segment_always_yields_two_nodes() {
        let parser = Parser::new(at_formula(), at_depth(1));
        let (graph, _) = parser.parse().unwrap();
        // predicate-always and its FALSE-degenerate refinement.
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn splitting_into_two_segments_grows_the_lattice() {
        let parser = Parser::new(at_formula(), at_depth(2));
        let (graph, _) = parser.parse().unwrap();
        assert!(graph.nodes.len() >= 2);
        // every node with a non-degenerate formula must carry the interval's
        // symbolic split point among its parameter names.
        let has_symbolic_split = graph
            .nodes
            .iter()
            .any(|n| !n.formula.get_param_names().is_empty());
        assert!(has_symbolic_split);
    }

    #[test]
    fn conjunction_of_two_predicates_depth_one() {
        let left = Formula::predicate("x", PredicateOp::Lt, 1.0, 0);
        let right = Formula::predicate("y", PredicateOp::Gt, 2.0, 1);
        let formula = Formula::mk_and(left, right);
        let depth = DepthSpec::Binary(Box::new(DepthSpec::Leaf), Box::new(DepthSpec::Leaf));
        let parser = Parser::new(formula, depth);
        let (graph, _) = parser.parse().unwrap();
        // and(p,q), and(p,FALSE)~=FALSE, and(FALSE,q)~=FALSE, and(FALSE,FALSE)~=FALSE
        // simplification collapses all FALSE-containing conjuncts into one FALSE node,
        // leaving: {p and q, p, q, FALSE} after dedup (rows differ only by operand choice).
        assert!(graph.nodes.len() >= 2);
        assert!(graph.nodes.len() <= 4);
    }

    #[test]
    fn mismatched_depth_shape_is_an_error() {
        let formula = Formula::mk_and(
            Formula::predicate("x", PredicateOp::Lt, 1.0, 0),
            Formula::predicate("y", PredicateOp::Gt, 2.0, 1),
        );
        // Binary formula but a Leaf depth spec: shape mismatch.
        let parser = Parser::new(formula, DepthSpec::Leaf);
        assert!(parser.parse().is_err());
    }
}
