//! Same midpoint-testing idea as `alw_mid`, but walks a random active path
//! (from a random active maximum, via random active immediate successors)
//! instead of the deterministic longest one.

use crate::lattice::PhiGraph;
use crate::strategies::{resolve_bounds, test_node, ClassifyConfig, StrategyOutcome};
use ndarray::Array3;
use rand::Rng;
use std::collections::HashMap;
use std::time::Instant;

pub fn classify(
    graph: &mut PhiGraph,
    interval_dict: &HashMap<String, (f64, f64)>,
    traces: &Array3<f64>,
    config: &ClassifyConfig,
    rng: &mut impl Rng,
) -> StrategyOutcome {
    let class_start = Instant::now();
    let mut num_synth_calls = 0u32;

    while !graph.is_empty() {
        let path = graph.random_path(rng);
        if path.is_empty() {
            break;
        }
        let mid = (path.len() + 1) / 2 - 1;
        let cur = path[mid];

        let bounds = resolve_bounds(graph, cur, interval_dict);
        let (satisfied, witness) = test_node(graph, cur, &bounds, traces, config);
        num_synth_calls += 1;

        if satisfied {
            graph.eliminate_hold(cur, witness);
        } else {
            graph.eliminate_unhold(cur);
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
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn eventually_empties_the_lattice() {
        let formula = Formula::mk_always(
            Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
            Bound::Const(0.0),
            Bound::Const(1.0),
        );
        let depth = DepthSpec::Temporal(2, Box::new(DepthSpec::Leaf));
        let parser = Parser::new(formula, depth);
        let (mut graph, interval_dict) = parser.parse().unwrap();

        let traces = Array3::from_shape_vec((1, 2, 1), vec![1.0, 1.0]).unwrap();
        let config = ClassifyConfig {
            dt: 1.0,
            max_evals_per_node: 10,
            time_budget_per_node: std::time::Duration::from_secs(1),
        };
        let mut rng = StdRng::seed_from_u64(42);
        classify(&mut graph, &interval_dict, &traces, &config, &mut rng);
        assert!(graph.is_empty());
    }
}
