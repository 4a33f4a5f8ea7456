//! Print results of a classification run, either a one-line summary or a
//! full per-node breakdown.

use crate::strategies::ClassificationResult;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PrintOptions {
    NoPrint,
    ShortPrint,
    MediumPrint,
    FullPrint,
}

/// Print the given text, but only if the correct print options are selected (medium or full).
/// This simplifies the code regarding printing (no redundant if statements).
pub(crate) fn print_if_allowed(text: String, print_options: PrintOptions) {
    if print_options == PrintOptions::NoPrint || print_options == PrintOptions::ShortPrint {
        return;
    }
    println!("{text}")
}

/// Print general info about the classification result - lattice size, coverage and timings.
pub(crate) fn summarize_results(result: &ClassificationResult) {
    println!(
        "{}/{} lattice nodes covered by a witness",
        result.num_covered, result.num_classes
    );
    println!("{} synthesis calls", result.num_synth_calls);
    println!(
        "parse {}ms / classify {}ms / total {}ms",
        result.time_split.as_millis(),
        result.time_class.as_millis(),
        result.time_total.as_millis()
    );
    println!("-----");
}

/// Print the general summary and then list every covered node's formula.
pub fn print_results_full(formula_label: &str, result: &ClassificationResult, node_labels: &[String]) {
    println!("Formula: {formula_label}");
    summarize_results(result);

    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    for &node in &result.covered_nodes {
        stdout
            .set_color(ColorSpec::new().set_fg(Some(Color::Green)))
            .unwrap();
        println!("  covered: {}", node_labels[node]);
    }
    stdout
        .set_color(ColorSpec::new().set_fg(Some(Color::White)))
        .unwrap();
    println!("-----");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_result() -> ClassificationResult {
        ClassificationResult {
            num_classes: 3,
            num_covered: 2,
            num_synth_calls: 3,
            time_split: Duration::from_millis(1),
            time_class: Duration::from_millis(2),
            time_total: Duration::from_millis(3),
            covered_nodes: vec![0, 2],
        }
    }

    #[test]
    fn print_if_allowed_is_silent_below_medium() {
        // smoke test: must not panic regardless of verbosity level
        print_if_allowed("hello".to_string(), PrintOptions::NoPrint);
        print_if_allowed("hello".to_string(), PrintOptions::ShortPrint);
        print_if_allowed("hello".to_string(), PrintOptions::MediumPrint);
    }

    #[test]
    fn summarize_results_does_not_panic_on_a_typical_result() {
        summarize_results(&sample_result());
    }
}
