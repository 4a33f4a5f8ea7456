//! CLI front-end for STL counterexample-trace classification.
//!
//! Builds one of two built-in specifications (`at`, `afc`), loads a trace
//! batch, refines the formula into a lattice and classifies it with the
//! chosen strategy. Exit code 0 on success, non-zero on loader or
//! configuration error.

use clap::builder::PossibleValuesParser;
use clap::Parser;

use stl_ceclass::analysis::analyse_formula;
use stl_ceclass::formula::{Bound, Formula, PredicateOp};
use stl_ceclass::lattice::DepthSpec;
use stl_ceclass::result_print::PrintOptions;
use stl_ceclass::strategies::{ClassifyConfig, Strategy};
use stl_ceclass::trace_loader::load_traces;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Duration;

/// Structure to collect CLI arguments.
#[derive(Parser)]
#[clap(version, about = "Refinement-lattice classification of STL counterexample traces.")]
struct Arguments {
    /// Path to a trace batch file (.npy, .npz or .mat).
    trace_path: String,

    /// Hierarchy depth (number of segments each temporal interval is split into).
    #[clap(short = 'k', long, default_value_t = 2)]
    depth: usize,

    /// Built-in specification to check.
    #[clap(long, default_value = "at", value_parser = PossibleValuesParser::new(["at", "afc"]))]
    spec: String,

    /// Classification strategy.
    #[clap(short, long, default_value = "long_bs", value_parser = PossibleValuesParser::new(["bfs", "no_prune", "alw_mid", "bs_random", "long_bs"]))]
    strategy: String,

    /// Time step between consecutive trace samples.
    #[clap(long, default_value_t = 1.0)]
    dt: f64,

    /// Wall-clock budget (seconds) per node's synthesis call.
    #[clap(long, default_value_t = 60.0)]
    max_time: f64,

    /// Evaluation-count budget per node's synthesis call.
    #[clap(long, default_value_t = 200)]
    max_evals: u32,

    /// Seed for the random-path/CMA-ES entropy source. Omit for a fresh seed.
    #[clap(long)]
    seed: Option<u64>,

    /// Optional path to write a results archive (lattice JSON + formula + CSV summary).
    #[clap(long)]
    output_archive: Option<String>,

    /// Choice of the amount of output regarding computation and results.
    #[clap(short, long, default_value = "short", value_parser = PossibleValuesParser::new(["none", "short", "medium", "full"]))]
    print_option: String,
}

fn build_at_spec(k: usize) -> (Formula, DepthSpec) {
    let speed = Formula::predicate("speed", PredicateOp::Lt, 90.0, 0);
    let rpm = Formula::predicate("RPM", PredicateOp::Lt, 4000.0, 1);
    let formula = Formula::mk_always(
        Formula::mk_and(speed, rpm),
        Bound::Const(0.0),
        Bound::Const(30.0),
    );
    let depth = DepthSpec::Temporal(
        k,
        Box::new(DepthSpec::Binary(
            Box::new(DepthSpec::Leaf),
            Box::new(DepthSpec::Leaf),
        )),
    );
    (formula, depth)
}

fn build_afc_spec(k: usize) -> (Formula, DepthSpec) {
    let lower = Formula::predicate("AF_err", PredicateOp::Gt, -0.05, 0);
    let upper = Formula::predicate("AF_err", PredicateOp::Lt, 0.05, 0);
    let always = Formula::mk_always(
        Formula::mk_and(lower, upper),
        Bound::Const(0.0),
        Bound::Const(10.0),
    );
    let formula = Formula::mk_eventually(always, Bound::Const(0.0), Bound::Const(40.0));
    let inner_depth = DepthSpec::Temporal(
        k,
        Box::new(DepthSpec::Binary(
            Box::new(DepthSpec::Leaf),
            Box::new(DepthSpec::Leaf),
        )),
    );
    let depth = DepthSpec::Temporal(k, Box::new(inner_depth));
    (formula, depth)
}

fn strategy_from_name(name: &str) -> Strategy {
    match name {
        "bfs" => Strategy::Bfs,
        "no_prune" => Strategy::NoPrune,
        "alw_mid" => Strategy::AlwMid,
        "bs_random" => Strategy::BsRandom,
        "long_bs" => Strategy::LongBs,
        // clap's PossibleValuesParser already rejects anything else.
        _ => unreachable!(),
    }
}

fn print_option_from_name(name: &str) -> PrintOptions {
    match name {
        "none" => PrintOptions::NoPrint,
        "short" => PrintOptions::ShortPrint,
        "medium" => PrintOptions::MediumPrint,
        "full" => PrintOptions::FullPrint,
        _ => unreachable!(),
    }
}

fn main() {
    env_logger::init();
    let args = Arguments::parse();

    if !Path::new(args.trace_path.as_str()).is_file() {
        eprintln!("{} is not a valid file", args.trace_path);
        std::process::exit(1);
    }

    let traces = match load_traces(Path::new(&args.trace_path), None) {
        Ok(traces) => traces,
        Err(e) => {
            eprintln!("Failed to load traces: {e}");
            std::process::exit(1);
        }
    };

    let (formula, depth) = match args.spec.as_str() {
        "at" => build_at_spec(args.depth),
        _ => build_afc_spec(args.depth),
    };

    let config = ClassifyConfig {
        dt: args.dt,
        max_evals_per_node: args.max_evals,
        time_budget_per_node: Duration::from_secs_f64(args.max_time),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let result = analyse_formula(
        formula,
        depth,
        args.depth,
        strategy_from_name(args.strategy.as_str()),
        &traces,
        config,
        print_option_from_name(args.print_option.as_str()),
        args.output_archive,
        &mut rng,
    );

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
