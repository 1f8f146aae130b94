use thiserror::Error;

use crate::problem::StandardProblem;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableauError {
    #[error(
        "Constraint `{constraint}` has no slack variable to start the basis; it needs a Phase-1 method, which is not supported"
    )]
    MissingBasicVariable { row: usize, constraint: String },
    #[error("Constraint `{constraint}` has a negative right-hand side; the origin is not a feasible starting point")]
    InfeasibleStart { row: usize, constraint: String },
    #[error("Objective has {found} coefficients but the problem has {expected} decision variables")]
    ObjectiveWidth { expected: usize, found: usize },
    #[error("Constraint `{constraint}` has {found} coefficients but the problem has {expected} variables")]
    RowWidth {
        constraint: String,
        expected: usize,
        found: usize,
    },
}

/// Dense simplex tableau.
///
/// Row 0 is the objective row, rows `1..=m` hold one constraint each. Column 0
/// is the `z` column, columns `1..=n` follow `variables`, and the last column
/// holds the right-hand side.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    variables: Vec<String>,
    /// `basis[i]` is basic in row `i + 1`
    basis: Vec<String>,
}

impl Tableau {
    /// Lay out a standard-form problem starting from the all-slack basis at the origin
    pub fn build(problem: &StandardProblem) -> Result<Self, TableauError> {
        let n_vars = problem.num_variables();
        let total_cols = n_vars + 2;

        if problem.objective.len() > n_vars {
            return Err(TableauError::ObjectiveWidth {
                expected: problem.decision_count,
                found: problem.objective.len(),
            });
        }

        // z - c.x = 0, so the origin reads z = 0
        let mut objective_row = vec![0.0; total_cols];
        objective_row[0] = 1.0;
        for (j, &coef) in problem.objective.iter().enumerate() {
            objective_row[j + 1] = -coef;
        }

        let mut data = Vec::with_capacity(problem.num_constraints() + 1);
        data.push(objective_row);

        let mut basis = Vec::with_capacity(problem.num_constraints());
        for (i, (constraint, basic)) in problem
            .constraints
            .iter()
            .zip(problem.initial_basis())
            .enumerate()
        {
            let row = i + 1;
            if constraint.equation.width() != n_vars {
                return Err(TableauError::RowWidth {
                    constraint: constraint.text.clone(),
                    expected: n_vars,
                    found: constraint.equation.width(),
                });
            }
            let Some(basic) = basic else {
                return Err(TableauError::MissingBasicVariable {
                    row,
                    constraint: constraint.text.clone(),
                });
            };
            if constraint.rhs() < 0.0 {
                return Err(TableauError::InfeasibleStart {
                    row,
                    constraint: constraint.text.clone(),
                });
            }

            let mut values = Vec::with_capacity(total_cols);
            values.push(0.0);
            values.extend_from_slice(&constraint.equation.coefficients);
            values.push(constraint.rhs());
            data.push(values);
            basis.push(basic);
        }

        Ok(Self {
            data,
            variables: problem.variables.clone(),
            basis,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    pub fn num_cols(&self) -> usize {
        self.variables.len() + 2
    }

    pub fn rhs_col(&self) -> usize {
        self.num_cols() - 1
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn basis(&self) -> &[String] {
        &self.basis
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    /// Current value of the objective
    pub fn objective_value(&self) -> f64 {
        self.rhs(0)
    }

    /// Name of the variable in tableau column `col` (1-based; column 0 is z)
    pub fn variable_at(&self, col: usize) -> &str {
        &self.variables[col - 1]
    }

    /// Tableau column of a variable
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name).map(|j| j + 1)
    }

    pub fn is_basic(&self, name: &str) -> bool {
        self.basis.iter().any(|b| b == name)
    }

    /// Value of every variable in universe order; non-basic variables read 0
    pub fn basic_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.variables.len()];
        for (i, name) in self.basis.iter().enumerate() {
            if let Some(col) = self.column_of(name) {
                values[col - 1] = self.rhs(i + 1);
            }
        }
        values
    }

    /// Whether `col` is a unit vector with its 1 in `row`
    pub fn is_unit_column(&self, col: usize, row: usize, tolerance: f64) -> bool {
        self.data.iter().enumerate().all(|(i, values)| {
            let expected = if i == row { 1.0 } else { 0.0 };
            (values[col] - expected).abs() <= tolerance
        })
    }

    /// Gauss-Jordan step on `(row, col)`: scale the pivot row to 1 in `col`,
    /// clear `col` from every other row, and make the column's variable basic
    /// in `row`.
    pub fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.num_cols();

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, values) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = values[col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                values[j] -= factor * pivot_row[j];
            }
        }

        self.basis[row - 1] = self.variables[col - 1].clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{
        Direction, InjectedKind, InjectedVariable, LinearExpression, Relation, StandardConstraint,
    };

    fn slack_row(text: &str, coefficients: Vec<f64>, rhs: f64, slack: &str) -> StandardConstraint {
        StandardConstraint {
            text: text.to_string(),
            relation: Relation::Le,
            injected: Some(InjectedVariable {
                name: slack.to_string(),
                kind: InjectedKind::Slack,
            }),
            sign_flipped: false,
            equation: LinearExpression::new(coefficients, rhs),
        }
    }

    fn sample_problem() -> StandardProblem {
        // Maximize z = 5x1 + 4x2
        //   6x1 + 4x2 <= 24
        //   x1 + 2x2 <= 6
        StandardProblem {
            direction: Direction::Maximize,
            objective_variable: "z".to_string(),
            variables: ["x1", "x2", "s3", "s4"].iter().map(|s| s.to_string()).collect(),
            decision_count: 2,
            objective: vec![5.0, 4.0],
            constraints: vec![
                slack_row("6x1 + 4x2 <= 24", vec![6.0, 4.0, 1.0, 0.0], 24.0, "s3"),
                slack_row("x1 + 2x2 <= 6", vec![1.0, 2.0, 0.0, 1.0], 6.0, "s4"),
            ],
        }
    }

    #[test]
    fn test_build_layout() {
        let tableau = Tableau::build(&sample_problem()).unwrap();
        assert_eq!(tableau.num_rows(), 3);
        assert_eq!(tableau.num_cols(), 6);
        assert_eq!(tableau.row(0), &[1.0, -5.0, -4.0, 0.0, 0.0, 0.0]);
        assert_eq!(tableau.row(1), &[0.0, 6.0, 4.0, 1.0, 0.0, 24.0]);
        assert_eq!(tableau.row(2), &[0.0, 1.0, 2.0, 0.0, 1.0, 6.0]);
        assert_eq!(tableau.basis(), &["s3".to_string(), "s4".to_string()]);
        assert_eq!(tableau.objective_value(), 0.0);
    }

    #[test]
    fn test_initial_basis_columns_are_unit_vectors() {
        let tableau = Tableau::build(&sample_problem()).unwrap();
        assert!(tableau.is_unit_column(0, 0, 1e-12));
        assert!(tableau.is_unit_column(3, 1, 1e-12));
        assert!(tableau.is_unit_column(4, 2, 1e-12));
    }

    #[test]
    fn test_pivot_makes_entering_column_unit() {
        let mut tableau = Tableau::build(&sample_problem()).unwrap();
        tableau.pivot(1, 1);

        assert!(tableau.is_unit_column(1, 1, 1e-12));
        assert!(tableau.is_unit_column(0, 0, 1e-12));
        assert_eq!(tableau.basis(), &["x1".to_string(), "s4".to_string()]);
        assert!((tableau.objective_value() - 20.0).abs() < 1e-9);
        assert!((tableau.rhs(1) - 4.0).abs() < 1e-9);
        assert!((tableau.rhs(2) - 2.0).abs() < 1e-9);

        let values = tableau.basic_values();
        assert!((values[0] - 4.0).abs() < 1e-9);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 0.0);
        assert!((values[3] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_row_without_injected_variable_is_rejected() {
        let mut problem = sample_problem();
        problem.constraints[1].injected = None;
        problem.constraints[1].relation = Relation::Eq;
        let err = Tableau::build(&problem).unwrap_err();
        assert!(matches!(err, TableauError::MissingBasicVariable { row: 2, .. }));
    }

    #[test]
    fn test_negative_rhs_is_rejected() {
        let mut problem = sample_problem();
        problem.constraints[0].equation.constant = -1.0;
        let err = Tableau::build(&problem).unwrap_err();
        assert!(matches!(err, TableauError::InfeasibleStart { row: 1, .. }));
    }

    #[test]
    fn test_column_lookup() {
        let tableau = Tableau::build(&sample_problem()).unwrap();
        assert_eq!(tableau.column_of("x1"), Some(1));
        assert_eq!(tableau.column_of("s4"), Some(4));
        assert_eq!(tableau.column_of("z"), None);
        assert_eq!(tableau.variable_at(2), "x2");
        assert!(tableau.is_basic("s3"));
        assert!(!tableau.is_basic("x1"));
    }
}
