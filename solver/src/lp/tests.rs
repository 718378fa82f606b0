use super::{is_optimal, HighsSolver, LpModel, LpSolution, LpSolver, LpStatus, RowSense};

const EPS: f64 = 1e-6;

/// reduced costs are non-negative and the dual objective equals the primal one
fn assert_dual_feasible(model: &LpModel, solution: &LpSolution) {
    for column in model.columns() {
        let reduced = column.cost
            - column
                .entries
                .iter()
                .map(|(i, a)| solution.duals[*i] * a)
                .sum::<f64>();
        assert!(reduced > -EPS, "negative reduced cost {}", reduced);
    }
    for (row, y) in model.rows().iter().zip(solution.duals.iter()) {
        match row.sense {
            RowSense::Le => assert!(*y < EPS),
            RowSense::Ge => assert!(*y > -EPS),
            RowSense::Eq => {}
        }
    }
    let dual_objective: f64 = model
        .rows()
        .iter()
        .zip(solution.duals.iter())
        .map(|(row, y)| row.rhs * y)
        .sum();
    assert!((dual_objective - solution.objective).abs() < EPS);
}

/// min 2x + 3y s.t. x + y >= 4, x <= 3, x - y = 1
fn mixed_rows() -> LpModel {
    let mut model = LpModel::new();
    let r0 = model.add_row(RowSense::Ge, 4.0);
    let r1 = model.add_row(RowSense::Le, 3.0);
    let r2 = model.add_row(RowSense::Eq, 1.0);
    model.add_column(2.0, vec![(r0, 1.0), (r1, 1.0), (r2, 1.0)]);
    model.add_column(3.0, vec![(r0, 1.0), (r2, -1.0)]);
    model
}

#[test]
fn test_mixed_rows() {
    // ARRANGE
    let model = mixed_rows();

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.objective - 9.5).abs() < EPS);
    assert!((solution.values[0] - 2.5).abs() < EPS);
    assert!((solution.values[1] - 1.5).abs() < EPS);
    assert!((solution.duals[0] - 2.5).abs() < EPS);
    assert!(solution.duals[1].abs() < EPS);
    assert!((solution.duals[2] + 0.5).abs() < EPS);
    assert_dual_feasible(&model, &solution);
}

#[test]
fn test_dual_of_binding_le_row_is_non_positive() {
    // ARRANGE
    // min -x s.t. x <= 5
    let mut model = LpModel::new();
    let r0 = model.add_row(RowSense::Le, 5.0);
    model.add_column(-1.0, vec![(r0, 1.0)]);

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.values[0] - 5.0).abs() < EPS);
    assert!((solution.duals[0] + 1.0).abs() < EPS);
}

#[test]
fn test_negative_rhs() {
    // ARRANGE
    // min x s.t. -x <= -2
    let mut model = LpModel::new();
    let r0 = model.add_row(RowSense::Le, -2.0);
    model.add_column(1.0, vec![(r0, -1.0)]);

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.values[0] - 2.0).abs() < EPS);
    assert!((solution.duals[0] + 1.0).abs() < EPS);
    assert_dual_feasible(&model, &solution);
}

#[test]
fn test_infeasible() {
    // ARRANGE
    let mut model = LpModel::new();
    let r0 = model.add_row(RowSense::Le, 1.0);
    let r1 = model.add_row(RowSense::Ge, 2.0);
    model.add_column(1.0, vec![(r0, 1.0), (r1, 1.0)]);

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Infeasible);
}

#[test]
fn test_degenerate_partitioning() {
    // ARRANGE
    // two rows that must be covered exactly once, a combined column is cheapest
    let mut model = LpModel::new();
    let t0 = model.add_row(RowSense::Eq, 1.0);
    let t1 = model.add_row(RowSense::Eq, 1.0);
    let convexity = model.add_row(RowSense::Le, 1.0);
    model.add_column(10.0, vec![(t0, 1.0)]);
    model.add_column(10.0, vec![(t1, 1.0)]);
    model.add_column(1.0, vec![(t0, 1.0), (convexity, 1.0)]);
    model.add_column(1.0, vec![(t1, 1.0), (convexity, 1.0)]);
    model.add_column(1.5, vec![(t0, 1.0), (t1, 1.0), (convexity, 1.0)]);

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.objective - 1.5).abs() < EPS);
    assert!((solution.values[4] - 1.0).abs() < EPS);
    assert_dual_feasible(&model, &solution);
}

#[test]
fn test_redundant_equality_rows() {
    // ARRANGE
    // min x + 2y s.t. x + y = 2, 2x + 2y = 4
    let mut model = LpModel::new();
    let r0 = model.add_row(RowSense::Eq, 2.0);
    let r1 = model.add_row(RowSense::Eq, 4.0);
    model.add_column(1.0, vec![(r0, 1.0), (r1, 2.0)]);
    model.add_column(2.0, vec![(r0, 1.0), (r1, 2.0)]);

    // ACT
    let solution = HighsSolver::default().solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.objective - 2.0).abs() < EPS);
    assert!((solution.values[0] - 2.0).abs() < EPS);
    assert_dual_feasible(&model, &solution);
}

#[test]
fn test_model_without_columns() {
    // ARRANGE
    let mut feasible = LpModel::new();
    feasible.add_row(RowSense::Le, 1.0);
    let mut infeasible = LpModel::new();
    infeasible.add_row(RowSense::Eq, 1.0);

    // ACT
    let solution = HighsSolver::default().solve(&feasible).unwrap();
    let no_solution = HighsSolver::default().solve(&infeasible).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert_eq!(solution.objective, 0.0);
    assert_eq!(solution.duals, vec![0.0]);
    assert_eq!(no_solution.status, LpStatus::Infeasible);
}

#[test]
fn test_optimality_certificate() {
    // ARRANGE
    let model = mixed_rows();
    let values = vec![2.5, 1.5];

    // ACT
    let optimal = is_optimal(&model, &values, &[2.5, 0.0, -0.5], 1e-9);
    let wrong_sign = is_optimal(&model, &values, &[-2.5, 0.0, 0.5], 1e-9);
    let suboptimal = is_optimal(&model, &[3.0, 2.0], &[2.5, 0.0, -0.5], 1e-9);
    let wrong_size = is_optimal(&model, &values, &[2.5, 0.0], 1e-9);

    // ASSERT
    assert!(optimal);
    assert!(!wrong_sign);
    assert!(!suboptimal);
    assert!(!wrong_size);
}

#[test]
fn test_configured_solver() {
    // ARRANGE
    let model = mixed_rows();
    let solver = HighsSolver::default()
        .with_time_limit(60.0)
        .with_tolerance(1e-7);

    // ACT
    let solution = solver.solve(&model).unwrap();

    // ASSERT
    assert_eq!(solution.status, LpStatus::Optimal);
    assert!((solution.objective - 9.5).abs() < EPS);
    assert_dual_feasible(&model, &solution);
}
