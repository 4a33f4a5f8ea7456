//! Bundle a classification run's results into a zip archive: the lattice
//! structure as JSON, the original formula as text, and a CSV summary row.

use crate::lattice::PhiGraph;
use crate::strategies::ClassificationResult;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

const CSV_HEADER: &str =
    "strategy,depth,num_traces,num_classes,num_covered,time_split_ms,time_class_ms,time_total_ms,num_synth_calls";

/// Create a results archive containing `lattice.json`, `formula.txt` and `summary.csv`.
pub fn build_result_archive(
    archive_name: &str,
    graph: &PhiGraph,
    formula_label: &str,
    strategy_name: &str,
    depth: usize,
    num_traces: usize,
    result: &ClassificationResult,
) -> Result<(), std::io::Error> {
    let archive_path = Path::new(archive_name);
    if let Some(prefix) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(prefix)?;
    }

    let archive = File::create(archive_path)?;
    let mut zip_writer = ZipWriter::new(archive);

    zip_writer
        .start_file("lattice.json", FileOptions::default())
        .map_err(std::io::Error::from)?;
    let export = graph.to_export();
    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))?;
    write!(zip_writer, "{json}")?;

    zip_writer
        .start_file("formula.txt", FileOptions::default())
        .map_err(std::io::Error::from)?;
    writeln!(zip_writer, "{formula_label}")?;

    zip_writer
        .start_file("summary.csv", FileOptions::default())
        .map_err(std::io::Error::from)?;
    writeln!(zip_writer, "{CSV_HEADER}")?;
    writeln!(
        zip_writer,
        "{strategy_name},{depth},{num_traces},{},{},{},{},{},{}",
        result.num_classes,
        result.num_covered,
        result.time_split.as_millis(),
        result.time_class.as_millis(),
        result.time_total.as_millis(),
        result.num_synth_calls,
    )?;

    zip_writer.finish().map_err(std::io::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Bound, Formula, PredicateOp};
    use crate::lattice::{DepthSpec, Parser};
    use std::time::Duration;

    #[test]
    fn archive_is_written_to_disk() {
        let formula = Formula::mk_always(
            Formula::predicate("x", PredicateOp::Gt, 0.0, 0),
            Bound::Const(0.0),
            Bound::Const(1.0),
        );
        let depth = DepthSpec::Temporal(1, Box::new(DepthSpec::Leaf));
        let parser = Parser::new(formula, depth);
        let (graph, _interval_dict) = parser.parse().unwrap();

        let result = ClassificationResult {
            num_classes: graph.nodes.len(),
            num_covered: 0,
            num_synth_calls: 0,
            time_split: Duration::from_millis(0),
            time_class: Duration::from_millis(0),
            time_total: Duration::from_millis(0),
            covered_nodes: Vec::new(),
        };

        let tmp = std::env::temp_dir().join("ceclass_generate_output_test.zip");
        let path = tmp.to_str().unwrap();
        build_result_archive(path, &graph, "always[0,1](x>0)", "no_prune", 1, 4, &result).unwrap();
        assert!(tmp.exists());
        std::fs::remove_file(tmp).unwrap();
    }
}
