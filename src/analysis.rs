//! Classification analysis from start to finish, with progress output and result prints.

use crate::formula::Formula;
use crate::lattice::{DepthSpec, Parser};
use crate::result_print::*;
use crate::strategies::{self, ClassificationResult, ClassifyConfig, Strategy};

use log::debug;
use ndarray::Array3;
use rand::Rng;
use std::time::SystemTime;

/// Perform the whole classification analysis for a single formula: build the
/// refinement lattice, run the chosen strategy, and summarize/print/export the
/// result.
///
/// If `archive_path` is provided, the lattice, formula text and a CSV summary
/// row are dumped there.
#[allow(clippy::too_many_arguments)]
pub fn analyse_formula(
    formula: Formula,
    depth: DepthSpec,
    depth_label: usize,
    strategy: Strategy,
    traces: &Array3<f64>,
    config: ClassifyConfig,
    print_opt: PrintOptions,
    archive_path: Option<String>,
    rng: &mut impl Rng,
) -> Result<ClassificationResult, String> {
    let start = SystemTime::now();
    print_if_allowed(
        "============ INITIAL PHASE ============".to_string(),
        print_opt,
    );

    let formula_label = formula.to_string();
    print_if_allowed(format!("Formula: {formula_label}"), print_opt);

    let parser = Parser::new(formula, depth);
    let (mut graph, interval_dict) = parser.parse()?;
    let time_split = start.elapsed().map_err(|e| e.to_string())?;
    debug!(
        "parsed lattice: {} nodes in {}ms",
        graph.nodes.len(),
        time_split.as_millis()
    );
    print_if_allowed(
        format!(
            "Built lattice with {} nodes ({}ms).",
            graph.nodes.len(),
            time_split.as_millis()
        ),
        print_opt,
    );
    print_if_allowed(
        "============= CLASSIFICATION PHASE =============".to_string(),
        print_opt,
    );

    let class_start = SystemTime::now();
    let outcome = match strategy {
        Strategy::NoPrune => strategies::no_prune::classify(&mut graph, &interval_dict, traces, &config),
        Strategy::Bfs => strategies::bfs::classify(&mut graph, &interval_dict, traces, &config),
        Strategy::AlwMid => strategies::alw_mid::classify(&mut graph, &interval_dict, traces, &config),
        Strategy::BsRandom => {
            strategies::bs_random::classify(&mut graph, &interval_dict, traces, &config, rng)
        }
        Strategy::LongBs => strategies::long_bs::classify(&mut graph, &interval_dict, traces, &config),
    };
    debug!(
        "classification finished: {} synthesis calls in {}ms",
        outcome.num_synth_calls,
        class_start.elapsed().map_err(|e| e.to_string())?.as_millis()
    );

    let result = strategies::build_result(&graph, time_split, outcome);

    let node_labels: Vec<String> = graph
        .nodes
        .iter()
        .map(|n| n.formula.to_string())
        .collect();
    match print_opt {
        PrintOptions::FullPrint => print_results_full(&formula_label, &result, &node_labels),
        PrintOptions::MediumPrint => summarize_results(&result),
        PrintOptions::ShortPrint => summarize_results(&result),
        PrintOptions::NoPrint => {}
    }

    if let Some(archive) = archive_path {
        print_if_allowed(format!("Writing results to {archive}."), print_opt);
        crate::generate_output::build_result_archive(
            archive.as_str(),
            &graph,
            &formula_label,
            strategy_name(strategy),
            depth_label,
            traces.shape()[0],
            &result,
        )
        .map_err(|e| e.to_string())?;
        print_if_allowed("Results successfully written.".to_string(), print_opt);
    }

    print_if_allowed(
        format!("Total computation time: {}ms", result.time_total.as_millis()),
        print_opt,
    );
    Ok(result)
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
