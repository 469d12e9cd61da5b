//! Linear programming bridge
//!
//! Thin adapter between the dense row-major constraint model built by the
//! factory planner and the Clarabel interior-point solver behind `good_lp`.
//! Problems are always minimize-form with non-negative variables:
//!
//! ```text
//! minimize    c . x
//! subject to  A_eq x  = b_eq
//!             A_ub x <= b_ub
//!             x >= 0
//! ```
//!
//! Inequality rows with a non-finite bound are unconstrained and skipped;
//! callers keep such rows only for slack bookkeeping.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel};

use crate::{Error, Result};

/// One dense constraint row: coefficients per variable plus a bound.
pub type Row = (Vec<f64>, f64);

/// Outcome of an LP solve
#[derive(Debug, Clone)]
pub enum LpOutcome {
    /// An optimal primal solution
    Optimal(Vec<f64>),
    /// The constraint set admits no point
    Infeasible,
    /// The objective is unbounded below on the feasible set
    Unbounded,
}

/// Minimize `objective . x` over `x >= 0` subject to dense equality and
/// upper-bound rows.
///
/// # Errors
///
/// Returns [`Error::Solver`] when the backend fails for a reason other than
/// infeasibility or unboundedness.
pub fn minimize(objective: &[f64], equalities: &[Row], upper_bounds: &[Row]) -> Result<LpOutcome> {
    let n = objective.len();

    let mut vars = variables!();
    let xs: Vec<_> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();

    let mut cost = Expression::from(0.0);
    for (&c, &x) in objective.iter().zip(&xs) {
        if c != 0.0 {
            cost += c * x;
        }
    }

    let mut model = vars.minimise(cost).using(clarabel);

    for (coefs, rhs) in equalities {
        let lhs = row_expression(coefs, &xs);
        let rhs = *rhs;
        model = model.with(constraint!(lhs == rhs));
    }
    for (coefs, bound) in upper_bounds {
        if !bound.is_finite() {
            continue;
        }
        let lhs = row_expression(coefs, &xs);
        let bound = *bound;
        model = model.with(constraint!(lhs <= bound));
    }

    match model.solve() {
        Ok(solution) => Ok(LpOutcome::Optimal(
            xs.iter().map(|&x| solution.value(x)).collect(),
        )),
        Err(ResolutionError::Infeasible) => Ok(LpOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(LpOutcome::Unbounded),
        Err(other) => Err(Error::solver(format!("lp backend: {other:?}"))),
    }
}

fn row_expression(coefs: &[f64], xs: &[good_lp::Variable]) -> Expression {
    let mut expr = Expression::from(0.0);
    for (&c, &x) in coefs.iter().zip(xs) {
        if c != 0.0 {
            expr += c * x;
        }
    }
    expr
}

/// Evaluate `bound - row . x`, the slack of an upper-bound row at `x`.
#[must_use]
pub fn slack(row: &[f64], bound: f64, x: &[f64]) -> f64 {
    let lhs: f64 = row.iter().zip(x).map(|(c, v)| c * v).sum();
    bound - lhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_minimize_with_equality() {
        // minimize x0 + 2 x1 subject to x0 + x1 = 10: all weight on x0
        let outcome = minimize(&[1.0, 2.0], &[(vec![1.0, 1.0], 10.0)], &[]).unwrap();
        match outcome {
            LpOutcome::Optimal(x) => {
                assert_abs_diff_eq!(x[0], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-6);
            }
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn test_minimize_with_upper_bound() {
        // minimize x0 + 2 x1 subject to x0 + x1 = 10, x0 <= 4
        let outcome = minimize(
            &[1.0, 2.0],
            &[(vec![1.0, 1.0], 10.0)],
            &[(vec![1.0, 0.0], 4.0)],
        )
        .unwrap();
        match outcome {
            LpOutcome::Optimal(x) => {
                assert_abs_diff_eq!(x[0], 4.0, epsilon = 1e-6);
                assert_abs_diff_eq!(x[1], 6.0, epsilon = 1e-6);
            }
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn test_infeasible() {
        // x0 = 5 but x0 <= 1
        let outcome = minimize(&[1.0], &[(vec![1.0], 5.0)], &[(vec![1.0], 1.0)]).unwrap();
        assert!(matches!(outcome, LpOutcome::Infeasible));
    }

    #[test]
    fn test_unbounded() {
        // minimize -x0 with x0 unbounded above
        let outcome = minimize(&[-1.0], &[], &[]).unwrap();
        assert!(matches!(outcome, LpOutcome::Unbounded));
    }

    #[test]
    fn test_infinite_bound_rows_are_skipped() {
        let outcome = minimize(
            &[1.0],
            &[(vec![1.0], 3.0)],
            &[(vec![1.0], f64::INFINITY)],
        )
        .unwrap();
        match outcome {
            LpOutcome::Optimal(x) => assert_abs_diff_eq!(x[0], 3.0, epsilon = 1e-6),
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn test_slack() {
        assert_abs_diff_eq!(slack(&[2.0, 1.0], 10.0, &[3.0, 1.0]), 3.0, epsilon = 1e-12);
        assert!(slack(&[1.0], f64::INFINITY, &[100.0]).is_infinite());
    }
}
