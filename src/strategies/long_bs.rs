//! Binary search over the longest active path: narrow the search window based
//! on each midpoint's test outcome rather than always retesting the same
//! middle element, so a chain of satisfied/unsatisfied results converges in
//! `O(log n)` tests instead of `O(n)`.

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

    while !graph.is_empty() {
        let path = graph.longest_path();
        if path.is_empty() {
            break;
        }

        let mut istart: i64 = 0;
        let mut iend: i64 = path.len() as i64 - 1;

        while istart <= iend {
            let mid = (istart + iend + 1) / 2;
            if mid as usize >= path.len() {
                break;
            }
            let cur = path[mid as usize];

            let bounds = resolve_bounds(graph, cur, interval_dict);
            let (satisfied, witness) = test_node(graph, cur, &bounds, traces, config);
            num_synth_calls += 1;

            if satisfied {
                graph.eliminate_hold(cur, witness);
                istart = mid + 1;
            } else {
                graph.eliminate_unhold(cur);
                iend = mid - 1;
            }
        }
    }

    StrategyOutcome {
        time_class: class_start.elapsed(),
        num_synth_calls,
    }
}
