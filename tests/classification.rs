//! End-to-end scenarios exercising formula refinement, lattice pruning and
//! strategy classification together.

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use stl_ceclass::formula::{Bound, Formula, PredicateOp};
use stl_ceclass::lattice::DepthSpec;
use stl_ceclass::strategies::{self, ClassifyConfig, Strategy};

fn config() -> ClassifyConfig {
    ClassifyConfig {
        dt: 1.0,
        max_evals_per_node: 30,
        time_budget_per_node: Duration::from_secs(2),
    }
}

/// Scenario A: a trivial conjunction at depth 1 builds a non-empty lattice,
/// and `no_prune` tests every node in it exactly once.
#[test]
fn scenario_a_trivial_conjunction_depth_one() {
    let speed = Formula::predicate("speed", PredicateOp::Lt, 90.0, 0);
    let rpm = Formula::predicate("RPM", PredicateOp::Lt, 4000.0, 1);
    let formula = Formula::mk_always(Formula::mk_and(speed, rpm), Bound::Const(0.0), Bound::Const(30.0));
    let depth = DepthSpec::Temporal(
        1,
        Box::new(DepthSpec::Binary(Box::new(DepthSpec::Leaf), Box::new(DepthSpec::Leaf))),
    );

    let (mut graph, interval_dict) = stl_ceclass::lattice::Parser::new(formula, depth)
        .parse()
        .unwrap();
    assert!(!graph.nodes.is_empty());
    let node_count = graph.nodes.len();

    let traces: Vec<f64> = (0..10)
        .flat_map(|_| {
            (0..31).flat_map(|_| vec![90.0, 4000.0])
        })
        .collect();
    let traces = Array3::from_shape_vec((10, 31, 2), traces).unwrap();

    let outcome = strategies::no_prune::classify(&mut graph, &interval_dict, &traces, &config());
    assert_eq!(outcome.num_synth_calls as usize, node_count);
}

/// Scenario D: regardless of traversal order, every strategy must reach the
/// same final covered-node set over the same lattice and traces, and a
/// pruning strategy can never need more synthesis calls than the exhaustive
/// baseline.
#[test]
fn scenario_d_strategy_equivalence_on_an_all_sat_lattice() {
    let formula = Formula::mk_always(
        Formula::predicate("x", PredicateOp::Gt, -10.0, 0),
        Bound::Const(0.0),
        Bound::Const(2.0),
    );
    let depth = DepthSpec::Temporal(2, Box::new(DepthSpec::Leaf));
    let traces = Array3::from_shape_vec((1, 3, 1), vec![1.0, 1.0, 1.0]).unwrap();

    let mut covered_sets = Vec::new();
    for strategy in [
        Strategy::NoPrune,
        Strategy::Bfs,
        Strategy::AlwMid,
        Strategy::LongBs,
    ] {
        let (mut graph, interval_dict) = stl_ceclass::lattice::Parser::new(formula.clone(), depth.clone())
            .parse()
            .unwrap();
        let outcome = match strategy {
            Strategy::NoPrune => strategies::no_prune::classify(&mut graph, &interval_dict, &traces, &config()),
            Strategy::Bfs => strategies::bfs::classify(&mut graph, &interval_dict, &traces, &config()),
            Strategy::AlwMid => strategies::alw_mid::classify(&mut graph, &interval_dict, &traces, &config()),
            Strategy::LongBs => strategies::long_bs::classify(&mut graph, &interval_dict, &traces, &config()),
            Strategy::BsRandom => unreachable!(),
        };
        let mut covered = graph.covered_nodes();
        covered.sort_unstable();
        covered_sets.push((strategy_name(strategy), covered, outcome.num_synth_calls));
    }

    let baseline = covered_sets[0].1.clone();
    for (_, covered, _) in &covered_sets {
        assert_eq!(covered, &baseline);
    }

    let no_prune_calls = covered_sets[0].2;
    let long_bs_calls = covered_sets
        .iter()
        .find(|(name, _, _)| *name == "long_bs")
        .unwrap()
        .2;
    assert!(no_prune_calls >= long_bs_calls);
}

fn strategy_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::NoPrune => "no_prune",
        Strategy::Bfs => "bfs",
        Strategy::AlwMid => "alw_mid",
        Strategy::BsRandom => "bs_random",
        Strategy::LongBs => "long_bs",
    }
}

/// Scenario F: an essentially zero time/eval budget still terminates (one
/// synthesis call per node, no runaway search), regardless of outcome.
#[test]
fn scenario_f_budget_bounded_termination() {
    let formula = Formula::mk_always(
        Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
        Bound::Const(0.0),
        Bound::Const(2.0),
    );
    let depth = DepthSpec::Temporal(2, Box::new(DepthSpec::Leaf));
    let (mut graph, interval_dict) = stl_ceclass::lattice::Parser::new(formula, depth).parse().unwrap();
    let node_count = graph.nodes.len();

    let traces = Array3::from_shape_vec((1, 3, 1), vec![1.0, 1.0, 1.0]).unwrap();
    let starved = ClassifyConfig {
        dt: 1.0,
        max_evals_per_node: 1,
        time_budget_per_node: Duration::from_millis(1),
    };

    let outcome = strategies::no_prune::classify(&mut graph, &interval_dict, &traces, &starved);
    assert_eq!(outcome.num_synth_calls as usize, node_count);
}

/// Invariant 9 (negation law): double negation returns to the original
/// formula, and negating the Boolean constants swaps them.
#[test]
fn invariant_negation_law() {
    let p = Formula::predicate("x", PredicateOp::Lt, 1.0, 0);
    let doubled = Formula::mk_not(Formula::mk_not(p.clone()));
    assert_eq!(doubled.to_string(), p.to_string());

    assert_eq!(Formula::mk_not(Formula::mk_true()).to_string(), Formula::mk_false().to_string());
    assert_eq!(Formula::mk_not(Formula::mk_false()).to_string(), Formula::mk_true().to_string());
}

/// Invariant 5/6: `eliminate_hold`/`eliminate_unhold` deactivate the whole
/// reachable closure along immediate edges, not just the target node.
#[test]
fn invariant_pruning_closure() {
    let formula = Formula::mk_always(
        Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
        Bound::Const(0.0),
        Bound::Const(2.0),
    );
    let depth = DepthSpec::Temporal(2, Box::new(DepthSpec::Leaf));
    let (mut graph, _interval_dict) = stl_ceclass::lattice::Parser::new(formula, depth).parse().unwrap();

    let node = (0..graph.nodes.len())
        .find(|&i| !graph.nodes[i].greater_imme.is_empty())
        .expect("lattice should have at least one non-maximal node");
    let ancestors = graph.nodes[node].greater_imme.clone();
    assert!(!ancestors.is_empty());

    let witness = stl_ceclass::lattice::Witness {
        trace_index: 0,
        params: Default::default(),
        objective: -1.0,
    };
    graph.eliminate_hold(node, witness);
    assert!(!graph.nodes[node].active);
    for ancestor in ancestors {
        assert!(!graph.nodes[ancestor].active);
    }
}

#[test]
fn random_path_strategy_is_deterministic_under_a_fixed_seed() {
    let formula = Formula::mk_always(
        Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
        Bound::Const(0.0),
        Bound::Const(2.0),
    );
    let depth = DepthSpec::Temporal(2, Box::new(DepthSpec::Leaf));
    let traces = Array3::from_shape_vec((1, 3, 1), vec![1.0, 1.0, 1.0]).unwrap();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let (mut graph, interval_dict) =
            stl_ceclass::lattice::Parser::new(formula.clone(), depth.clone()).parse().unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        strategies::bs_random::classify(&mut graph, &interval_dict, &traces, &config(), &mut rng);
        let mut covered = graph.covered_nodes();
        covered.sort_unstable();
        runs.push(covered);
    }
    assert_eq!(runs[0], runs[1]);
}
