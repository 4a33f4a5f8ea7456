//! Sweep over depth values and trace counts for every strategy, collecting
//! results into a CSV file.
//!
//! Usage: `cargo run --example benchmark -- --output results.csv`

use clap::Parser;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::time::Duration;

use stl_ceclass::analysis::analyse_formula;
use stl_ceclass::formula::{Bound, Formula, PredicateOp};
use stl_ceclass::lattice::DepthSpec;
use stl_ceclass::result_print::PrintOptions;
use stl_ceclass::strategies::{ClassifyConfig, Strategy};

const STRATEGIES: [(&str, Strategy); 5] = [
    ("long_bs", Strategy::LongBs),
    ("bfs", Strategy::Bfs),
    ("no_prune", Strategy::NoPrune),
    ("alw_mid", Strategy::AlwMid),
    ("bs_random", Strategy::BsRandom),
];
const DEPTHS: [usize; 5] = [1, 2, 3, 4, 5];
const TRACE_COUNTS: [usize; 4] = [30, 50, 70, 100];

#[derive(Parser)]
struct Args {
    #[clap(long, default_value_t = 1.0)]
    dt: f64,
    #[clap(long, default_value_t = 20.0)]
    max_time: f64,
    #[clap(long, default_value_t = 200)]
    max_evals: u32,
    #[clap(long, default_value = "benchmark_results.csv")]
    output: String,
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

fn main() {
    let args = Args::parse();
    let mut rng = StdRng::from_entropy();

    let total_runs = STRATEGIES.len() * DEPTHS.len() * TRACE_COUNTS.len();
    println!(
        "Benchmark: {} strategies x {} depths x {} trace counts = {total_runs} runs",
        STRATEGIES.len(),
        DEPTHS.len(),
        TRACE_COUNTS.len()
    );
    println!("Output: {}", args.output);
    println!("{}", "=".repeat(80));

    let mut file = File::create(&args.output).expect("failed to create output file");
    writeln!(
        file,
        "strategy,k,num_traces,num_classes,num_covered,time_split_ms,time_class_ms,time_total_ms,num_synth_calls"
    )
    .unwrap();

    let mut run_idx = 0;
    for &(strategy_name, strategy) in &STRATEGIES {
        for &depth_val in &DEPTHS {
            for &num_traces in &TRACE_COUNTS {
                run_idx += 1;
                print!("[{run_idx}/{total_runs}] strategy={strategy_name}, k={depth_val}, traces={num_traces} ... ");
                std::io::stdout().flush().unwrap();

                let (formula, depth) = build_at_spec(depth_val);
                let traces = generate_traces(num_traces, 50, &mut rng);
                let config = ClassifyConfig {
                    dt: args.dt,
                    max_evals_per_node: args.max_evals,
                    time_budget_per_node: Duration::from_secs_f64(args.max_time),
                };

                match analyse_formula(
                    formula,
                    depth,
                    depth_val,
                    strategy,
                    &traces,
                    config,
                    PrintOptions::NoPrint,
                    None,
                    &mut rng,
                ) {
                    Ok(result) => {
                        println!(
                            "classes={}, covered={}, calls={}, time={}ms",
                            result.num_classes,
                            result.num_covered,
                            result.num_synth_calls,
                            result.time_total.as_millis()
                        );
                        writeln!(
                            file,
                            "{strategy_name},{depth_val},{num_traces},{},{},{},{},{},{}",
                            result.num_classes,
                            result.num_covered,
                            result.time_split.as_millis(),
                            result.time_class.as_millis(),
                            result.time_total.as_millis(),
                            result.num_synth_calls,
                        )
                        .unwrap();
                    }
                    Err(e) => {
                        println!("FAILED: {e}");
                        writeln!(file, "{strategy_name},{depth_val},{num_traces},-1,-1,-1,-1,-1,-1").unwrap();
                    }
                }
            }
        }
    }

    println!("{}", "=".repeat(80));
    println!("Done. Results written to {}", args.output);
}
