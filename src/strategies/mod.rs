//! Classification strategies: different traversal orders over the same
//! refinement lattice, all built on the same per-node test primitive.

pub mod alw_mid;
pub mod bfs;
pub mod bs_random;
pub mod long_bs;
pub mod no_prune;

use crate::lattice::{NodeId, PhiGraph, Witness};
use crate::synthesis::ParamSynthesis;
use ndarray::Array3;
use std::collections::HashMap;
use std::time::Duration;

/// A strategy's traversal order over the lattice. Each variant wraps the
/// per-strategy module's entry point so `analysis.rs` can dispatch on a CLI flag.
#[derive(Clone, Copy, Debug)]
pub enum Strategy {
    NoPrune,
    Bfs,
    AlwMid,
    BsRandom,
    LongBs,
}

/// Parameters shared by every node test: the trace batch, the discretization
/// step, and the per-node synthesis budget.
pub struct ClassifyConfig {
    pub dt: f64,
    pub max_evals_per_node: u32,
    pub time_budget_per_node: Duration,
}

/// Summary of a full classification run over one lattice.
#[derive(Clone, Debug)]
pub struct ClassificationResult {
    pub num_classes: usize,
    pub num_covered: usize,
    pub num_synth_calls: u32,
    pub time_split: Duration,
    pub time_class: Duration,
    pub time_total: Duration,
    pub covered_nodes: Vec<NodeId>,
}

/// What a strategy module measures directly; `analysis.rs` combines this with
/// the lattice-parsing duration (measured outside the strategy) to build the
/// full [ClassificationResult].
pub struct StrategyOutcome {
    pub time_class: Duration,
    pub num_synth_calls: u32,
}

/// Shared node-test primitive used by every strategy: zero symbolic bounds are
/// evaluated directly (no search), one or more delegate to [ParamSynthesis].
pub fn test_node(
    graph: &PhiGraph,
    node: NodeId,
    param_bounds: &HashMap<String, (f64, f64)>,
    traces: &Array3<f64>,
    config: &ClassifyConfig,
) -> (bool, Witness) {
    let formula = &graph.nodes[node].formula;
    let synth = ParamSynthesis::new(
        formula,
        param_bounds,
        config.dt,
        traces,
        config.max_evals_per_node,
        config.time_budget_per_node,
    );

    let result = match synth {
        Ok(synth) => synth.solve(),
        Err(_) => crate::synthesis::SynthResult {
            satisfied: false,
            obj_best: 1e9,
            params_best: None,
            num_evals: 0,
            time_spent: Duration::from_secs(0),
        },
    };

    let witness = Witness {
        trace_index: 0,
        params: result.params_best.unwrap_or_default(),
        objective: result.obj_best,
    };
    (result.satisfied, witness)
}

/// A node's symbolic bounds, looked up against the parser's registered
/// `interval_dict`.
pub fn resolve_bounds(
    graph: &PhiGraph,
    node: NodeId,
    interval_dict: &HashMap<String, (f64, f64)>,
) -> HashMap<String, (f64, f64)> {
    graph.nodes[node].formula.get_param_bounds(interval_dict)
}

/// Assemble the full result once a strategy has finished, given the
/// lattice-parsing duration measured by the caller.
pub fn build_result(
    graph: &PhiGraph,
    time_split: Duration,
    outcome: StrategyOutcome,
) -> ClassificationResult {
    ClassificationResult {
        num_classes: graph.nodes.len(),
        num_covered: graph.covered_nodes().len(),
        num_synth_calls: outcome.num_synth_calls,
        time_split,
        time_class: outcome.time_class,
        time_total: time_split + outcome.time_class,
        covered_nodes: graph.covered_nodes(),
    }
}
