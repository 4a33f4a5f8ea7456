//! Counterexample classification for the Automatic Transmission benchmark.
//!
//! Reproduces the CEClass paper's AT1 benchmark: `always_[0,30]((speed < 90) and (RPM < 4000))`.
//! Falls back to synthetic traces oscillating around the violation boundary when no `--data`
//! file is given.
//!
//! Usage: `cargo run --example autotrans -- --data test/data/AT1.mat --depth 2 --strategy long_bs`

use clap::Parser;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::Duration;

use stl_ceclass::analysis::analyse_formula;
use stl_ceclass::formula::{Bound, Formula, PredicateOp};
use stl_ceclass::lattice::DepthSpec;
use stl_ceclass::result_print::PrintOptions;
use stl_ceclass::strategies::{ClassifyConfig, Strategy};
use stl_ceclass::trace_loader::load_traces;

#[derive(Parser)]
struct Args {
    #[clap(long)]
    data: Option<String>,
    #[clap(long, default_value_t = 2)]
    depth: usize,
    #[clap(long, default_value = "long_bs")]
    strategy: String,
    #[clap(long, default_value_t = 1.0)]
    dt: f64,
    #[clap(long, default_value_t = 60.0)]
    max_time: f64,
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

/// Synthetic traces with speed oscillating around 90 and RPM around 4000,
/// so the AT spec is falsified on a nontrivial subset of each run.
fn generate_traces(num_traces: usize, timesteps: usize, rng: &mut impl Rng) -> Array3<f64> {
    let mut data = vec![0.0; num_traces * timesteps * 2];
    for t in 0..num_traces {
        for s in 0..timesteps {
            let base = (t * timesteps + s) * 2;
            data[base] = 80.0 + 20.0 * rng.gen::<f64>();
            data[base + 1] = 3500.0 + 1000.0 * rng.gen::<f64>();
        }
    }
    Array3::from_shape_vec((num_traces, timesteps, 2), data).unwrap()
}

fn strategy_from_name(name: &str) -> Strategy {
    match name {
        "bfs" => Strategy::Bfs,
        "no_prune" => Strategy::NoPrune,
        "alw_mid" => Strategy::AlwMid,
        "bs_random" => Strategy::BsRandom,
        _ => Strategy::LongBs,
    }
}

fn main() {
    let args = Args::parse();
    let mut rng = StdRng::from_entropy();

    let traces = match &args.data {
        Some(path) => load_traces(Path::new(path), None).expect("failed to load trace data"),
        None => {
            println!("No data provided, generating synthetic traces...");
            generate_traces(30, 50, &mut rng)
        }
    };

    let (formula, depth) = build_at_spec(args.depth);
    println!("Strategy: {}", args.strategy);
    println!("Formula: {formula}");
    println!("Traces shape: {:?}", traces.shape());
    println!("{}", "-".repeat(60));

    let config = ClassifyConfig {
        dt: args.dt,
        max_evals_per_node: 200,
        time_budget_per_node: Duration::from_secs_f64(args.max_time),
    };

    analyse_formula(
        formula,
        depth,
        args.depth,
        strategy_from_name(args.strategy.as_str()),
        &traces,
        config,
        PrintOptions::FullPrint,
        None,
        &mut rng,
    )
    .expect("classification failed");
}
