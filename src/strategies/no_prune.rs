//! Baseline strategy: test every node in the lattice, in order, without pruning
//! the search space based on results. Useful as a correctness reference for
//! the pruning strategies.

use crate::lattice::PhiGraph;
use crate::strategies::{resolve_bounds, test_node, ClassifyConfig, StrategyOutcome};
use ndarray::Array3;
use std::collections::HashMap;
use std::time::Instant;

pub fn classify(
    graph: &mut PhiGraph,
    interval_dict: &HashMap<String, (f64, f64)>,
    traces: &Array3<f64>,
    config: &ClassifyConfig,
) -> StrategyOutcome {
    let class_start = Instant::now();
    let mut num_synth_calls = 0u32;

    for node in 0..graph.nodes.len() {
        let bounds = resolve_bounds(graph, node, interval_dict);
        let (satisfied, witness) = test_node(graph, node, &bounds, traces, config);
        num_synth_calls += 1;
        if satisfied {
            graph.nodes[node].witnesses.push(witness);
        }
    }

    StrategyOutcome {
        time_class: class_start.elapsed(),
        num_synth_calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Bound, Formula, PredicateOp};
    use crate::lattice::{DepthSpec, Parser};

    #[test]
    fn tests_every_node_regardless_of_outcome() {
        let formula = Formula::mk_always(
            Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
            Bound::Const(0.0),
            Bound::Const(1.0),
        );
        let depth = DepthSpec::Temporal(1, Box::new(DepthSpec::Leaf));
        let parser = Parser::new(formula, depth);
        let (mut graph, interval_dict) = parser.parse().unwrap();

        let traces = Array3::from_shape_vec((1, 2, 1), vec![1.0, 1.0]).unwrap();
        let config = ClassifyConfig {
            dt: 1.0,
            max_evals_per_node: 10,
            time_budget_per_node: std::time::Duration::from_secs(1),
        };
        let node_count = graph.nodes.len();
        let outcome = classify(&mut graph, &interval_dict, &traces, &config);
        assert_eq!(outcome.num_synth_calls as usize, node_count);
    }
}
