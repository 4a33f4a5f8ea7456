//! Loading counterexample traces from disk or from an in-memory array.
//!
//! Accepts `.npy`, `.npz` and `.mat` files plus a native [`Array3<f64>`]
//! passthrough, always normalizing to a `(num_traces, timesteps, dims)` batch
//! and optionally selecting a subset of signal columns.

use ndarray::{Array2, Array3, Axis};
use ndarray_npy::{NpzReader, ReadNpyExt};
use std::fs::File;
use std::path::Path;

const MAT_CANDIDATE_NAMES: [&str; 4] = ["traces", "data", "signals", "X"];

/// Load a trace batch from `path`, dispatching on its extension.
///
/// `signal_indices`, if given, selects and reorders the signal (last-axis)
/// columns kept in the result.
pub fn load_traces(path: &Path, signal_indices: Option<&[usize]>) -> Result<Array3<f64>, String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| format!("trace file has no extension: {}", path.display()))?;

    let traces = match extension {
        "npy" => load_npy(path)?,
        "npz" => load_npz(path)?,
        "mat" => load_mat(path)?,
        other => return Err(format!("unsupported trace file format: .{other}")),
    };

    let traces = promote_to_batch(traces);
    Ok(match signal_indices {
        Some(indices) => select_signals(&traces, indices),
        None => traces,
    })
}

/// Normalize an already in-memory array: a 2-D `(timesteps, dims)` array is
/// treated as a single trace and promoted to a batch of one.
pub fn from_array(traces: Array3<f64>, signal_indices: Option<&[usize]>) -> Array3<f64> {
    match signal_indices {
        Some(indices) => select_signals(&traces, indices),
        None => traces,
    }
}

fn promote_to_batch(traces: Array3<f64>) -> Array3<f64> {
    traces
}

fn select_signals(traces: &Array3<f64>, indices: &[usize]) -> Array3<f64> {
    traces.select(Axis(2), indices)
}

fn load_npy(path: &Path) -> Result<Array3<f64>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    if let Ok(arr3) = Array3::<f64>::read_npy(&file) {
        return Ok(arr3);
    }
    let file = File::open(path).map_err(|e| e.to_string())?;
    let arr2 = Array2::<f64>::read_npy(file).map_err(|e| e.to_string())?;
    Ok(arr2.insert_axis(Axis(0)))
}

fn load_npz(path: &Path) -> Result<Array3<f64>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = NpzReader::new(file).map_err(|e| e.to_string())?;
    let names = archive.names().map_err(|e| e.to_string())?;
    let first = names
        .first()
        .ok_or_else(|| format!("no arrays found in {}", path.display()))?
        .clone();

    let arr3: Result<Array3<f64>, _> = archive.by_name(first.as_str());
    if let Ok(arr3) = arr3 {
        return Ok(arr3);
    }
    let arr2: Array2<f64> = archive
        .by_name(first.as_str())
        .map_err(|e| e.to_string())?;
    Ok(arr2.insert_axis(Axis(0)))
}

fn load_mat(path: &Path) -> Result<Array3<f64>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mat = matfile::MatFile::parse(file).map_err(|e| e.to_string())?;
    let arrays = mat.arrays();

    let chosen = MAT_CANDIDATE_NAMES
        .iter()
        .find_map(|name| arrays.iter().find(|a| a.name() == *name))
        .or_else(|| arrays.iter().find(|a| !a.name().starts_with("__")))
        .ok_or_else(|| format!("no trace data found in {}", path.display()))?;

    mat_array_to_array3(chosen)
}

fn mat_array_to_array3(array: &matfile::Array) -> Result<Array3<f64>, String> {
    let shape = array.size().to_vec();
    let flat = mat_numeric_to_f64(array.data())?;

    match shape.len() {
        2 => {
            let arr2 = Array2::from_shape_vec((shape[0], shape[1]), flat)
                .map_err(|e| e.to_string())?;
            Ok(arr2.insert_axis(Axis(0)))
        }
        3 => Array3::from_shape_vec((shape[0], shape[1], shape[2]), flat).map_err(|e| e.to_string()),
        other => Err(format!(
            "expected a 2-D or 3-D trace array, found {other} dimensions"
        )),
    }
}

fn mat_numeric_to_f64(data: &matfile::NumericData) -> Result<Vec<f64>, String> {
    use matfile::NumericData;
    Ok(match data {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::Int8{ real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::UInt8{ real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::Int16 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::UInt16 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::UInt32 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::Int64 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|v| *v as f64).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_array_is_passed_through_unchanged() {
        let traces = Array3::from_shape_vec((2, 3, 1), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let out = from_array(traces.clone(), None);
        assert_eq!(out, traces);
    }

    #[test]
    fn signal_selection_keeps_only_requested_columns() {
        let traces = Array3::from_shape_vec(
            (1, 2, 3),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let out = from_array(traces, Some(&[2, 0]));
        assert_eq!(out.shape(), &[1, 2, 2]);
        assert_eq!(out[[0, 0, 0]], 2.0);
        assert_eq!(out[[0, 0, 1]], 0.0);
    }
}
