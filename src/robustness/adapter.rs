//! Lowers a [Formula] (plus a parameter binding) into the kernel's evaluable [Expr] tree.

use crate::formula::{Bound, Formula, NodeType};
use crate::robustness::kernel::Expr;
use std::collections::HashMap;

/// A large constant used to realize the `TRUE`/`FALSE` sentinels as extreme-robustness
/// predicates, matching the teacher formula's (and the original's) convention.
const SENTINEL_MAGNITUDE: f64 = 1e6;

fn resolve_bound(bound: &Bound, params: &HashMap<String, f64>) -> Result<f64, String> {
    match bound {
        Bound::Const(v) => Ok(*v),
        Bound::Symbol(name) => params
            .get(name)
            .copied()
            .ok_or_else(|| format!("unresolved symbolic interval bound '{name}'")),
    }
}

/// Convert a continuous-time interval `(a, b)` to discrete step indices `(round(a/dt), round(b/dt))`.
fn to_step_range(a: f64, b: f64, dt: f64) -> Result<(usize, usize), String> {
    if dt <= 0.0 {
        return Err(format!("dt must be strictly positive, got {dt}"));
    }
    let lo = (a / dt).round();
    let hi = (b / dt).round();
    if lo < 0.0 || hi < 0.0 {
        return Err(format!("negative step index from interval ({a}, {b}) at dt={dt}"));
    }
    Ok((lo as usize, hi as usize))
}

/// Lower `formula` into an [Expr], resolving any symbolic interval bounds through `params`.
pub fn lower(formula: &Formula, params: &HashMap<String, f64>, dt: f64) -> Result<Expr, String> {
    match &formula.node_type {
        NodeType::Predicate {
            op,
            threshold,
            signal_index,
            ..
        } => Ok(Expr::Predicate {
            signal_index: *signal_index,
            op: *op,
            threshold: *threshold,
        }),
        NodeType::True => Ok(Expr::Const(SENTINEL_MAGNITUDE)),
        NodeType::False => Ok(Expr::Const(-SENTINEL_MAGNITUDE)),
        NodeType::Not(child) => Ok(Expr::Not(Box::new(lower(child, params, dt)?))),
        NodeType::And(left, right) => Ok(Expr::And(
            Box::new(lower(left, params, dt)?),
            Box::new(lower(right, params, dt)?),
        )),
        NodeType::Or(left, right) => Ok(Expr::Or(
            Box::new(lower(left, params, dt)?),
            Box::new(lower(right, params, dt)?),
        )),
        NodeType::Always(child, lo, hi) => {
            let a = resolve_bound(lo, params)?;
            let b = resolve_bound(hi, params)?;
            let (lo_idx, hi_idx) = to_step_range(a, b, dt)?;
            Ok(Expr::Always(Box::new(lower(child, params, dt)?), lo_idx, hi_idx))
        }
        NodeType::Eventually(child, lo, hi) => {
            let a = resolve_bound(lo, params)?;
            let b = resolve_bound(hi, params)?;
            let (lo_idx, hi_idx) = to_step_range(a, b, dt)?;
            Ok(Expr::Eventually(
                Box::new(lower(child, params, dt)?),
                lo_idx,
                hi_idx,
            ))
        }
    }
}
