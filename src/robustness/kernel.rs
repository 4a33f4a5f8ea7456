//! A small, explicitly-scoped STL quantitative-semantics evaluator.
//!
//! Supports exactly the operators the adapter ever lowers to: `<` / `>` predicates,
//! `not`, `and`, `or`, and interval-bounded `always` / `eventually` over integer step
//! indices. No unbounded/until operators, no derivative signals.

use crate::formula::PredicateOp;
use ndarray::{Array1, Array3, ArrayView2, Axis};

/// The kernel's evaluable representation, produced by [crate::robustness::adapter::lower].
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Predicate {
        signal_index: usize,
        op: PredicateOp,
        threshold: f64,
    },
    /// A constant robustness value at every timestep (used to realize `true`/`false`).
    Const(f64),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Always(Box<Expr>, usize, usize),
    Eventually(Box<Expr>, usize, usize),
}

/// Quantitative robustness of `expr` at every timestep of a single trace
/// (shape `timesteps × signal_dims`).
fn robustness_series(expr: &Expr, trace: ArrayView2<f64>) -> Array1<f64> {
    let timesteps = trace.shape()[0];
    match expr {
        Expr::Predicate {
            signal_index,
            op,
            threshold,
        } => {
            let column = trace.column(*signal_index).to_owned();
            match op {
                PredicateOp::Lt => *threshold - column,
                PredicateOp::Gt => column - *threshold,
            }
        }
        Expr::Const(value) => Array1::from_elem(timesteps, *value),
        Expr::Not(child) => -robustness_series(child, trace),
        Expr::And(left, right) => {
            let l = robustness_series(left, trace);
            let r = robustness_series(right, trace);
            l.iter().zip(r.iter()).map(|(a, b)| a.min(*b)).collect()
        }
        Expr::Or(left, right) => {
            let l = robustness_series(left, trace);
            let r = robustness_series(right, trace);
            l.iter().zip(r.iter()).map(|(a, b)| a.max(*b)).collect()
        }
        Expr::Always(child, lo, hi) => windowed(child, trace, *lo, *hi, f64::INFINITY, f64::min),
        Expr::Eventually(child, lo, hi) => {
            windowed(child, trace, *lo, *hi, f64::NEG_INFINITY, f64::max)
        }
    }
}

/// Shared implementation of bounded `always`/`eventually`: at each timestep `t`, fold
/// the child's robustness series over the window `[t + lo, t + hi]`, clamped to the
/// trace's available length.
fn windowed(
    child: &Expr,
    trace: ArrayView2<f64>,
    lo: usize,
    hi: usize,
    identity: f64,
    fold: impl Fn(f64, f64) -> f64,
) -> Array1<f64> {
    let series = robustness_series(child, trace);
    let timesteps = series.len();
    let mut out = Array1::from_elem(timesteps, identity);
    for t in 0..timesteps {
        let window_lo = t.saturating_add(lo).min(timesteps.saturating_sub(1));
        let window_hi = t.saturating_add(hi).min(timesteps.saturating_sub(1));
        let mut acc = identity;
        for v in series.slice(ndarray::s![window_lo..=window_hi]) {
            acc = fold(acc, *v);
        }
        out[t] = acc;
    }
    out
}

/// Robustness of `expr` on a single trace, evaluated at `t = 0` (the standard
/// convention for the robustness of an entire trace against a formula).
pub fn robustness(expr: &Expr, trace: ArrayView2<f64>) -> f64 {
    robustness_series(expr, trace)[0]
}

/// Robustness of `expr` over every trace in a batch (shape
/// `num_traces × timesteps × signal_dims`), one value per trace.
pub fn robustness_batch(expr: &Expr, traces: &Array3<f64>) -> Array1<f64> {
    let n = traces.shape()[0];
    let mut out = Array1::zeros(n);
    for (i, trace) in traces.axis_iter(Axis(0)).enumerate() {
        out[i] = robustness(expr, trace);
    }
    out
}

/// Swappable boundary for the robustness evaluator, per the arena/kernel-boundary
/// design note: an alternative kernel (GPU-backed, differentiable, ...) can implement
/// this trait without the lattice or classifier code needing to change.
pub trait RobustnessKernel {
    fn evaluate_batch(&self, expr: &Expr, traces: &Array3<f64>) -> Array1<f64>;
}

/// The kernel implemented directly above, exposed through the trait boundary.
pub struct DefaultKernel;

impl RobustnessKernel for DefaultKernel {
    fn evaluate_batch(&self, expr: &Expr, traces: &Array3<f64>) -> Array1<f64> {
        robustness_batch(expr, traces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn predicate_robustness_matches_margin() {
        let expr = Expr::Predicate {
            signal_index: 0,
            op: PredicateOp::Lt,
            threshold: 5.0,
        };
        let trace = array![[3.0], [7.0]];
        let series = robustness_series(&expr, trace.view());
        assert_eq!(series, array![2.0, -2.0]);
    }

    #[test]
    fn and_takes_pointwise_minimum() {
        let a = Expr::Const(1.0);
        let b = Expr::Const(-3.0);
        let trace = array![[0.0], [0.0]];
        let series = robustness_series(&Expr::And(Box::new(a), Box::new(b)), trace.view());
        assert_eq!(series, array![-3.0, -3.0]);
    }

    #[test]
    fn always_takes_window_minimum() {
        let child = Expr::Predicate {
            signal_index: 0,
            op: PredicateOp::Gt,
            threshold: 0.0,
        };
        // values: -1, 2, 3, -4 at t=0..3
        let trace = array![[-1.0], [2.0], [3.0], [-4.0]];
        let expr = Expr::Always(Box::new(child), 0, 3);
        assert_eq!(robustness(&expr, trace.view()), -4.0);
    }

    #[test]
    fn eventually_takes_window_maximum() {
        let child = Expr::Predicate {
            signal_index: 0,
            op: PredicateOp::Gt,
            threshold: 0.0,
        };
        let trace = array![[-1.0], [2.0], [3.0], [-4.0]];
        let expr = Expr::Eventually(Box::new(child), 0, 3);
        assert_eq!(robustness(&expr, trace.view()), 3.0);
    }

    #[test]
    fn batch_returns_one_value_per_trace() {
        let child = Expr::Predicate {
            signal_index: 0,
            op: PredicateOp::Gt,
            threshold: 0.0,
        };
        let traces: Array3<f64> = Array3::from_shape_vec((2, 2, 1), vec![1.0, 1.0, -1.0, -1.0]).unwrap();
        let result = robustness_batch(&child, &traces);
        assert_eq!(result, array![1.0, -1.0]);
    }
}
