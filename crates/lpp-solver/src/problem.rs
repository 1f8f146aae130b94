use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Expected {expected} coefficients, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Whether the objective is maximized or minimized
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Maximize => write!(f, "Maximize"),
            Direction::Minimize => write!(f, "Minimize"),
        }
    }
}

/// Relation between the two sides of a constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
            Relation::Eq => write!(f, "="),
        }
    }
}

/// One side of an equation as a dense coefficient vector over the variable
/// universe, plus the constant on the other side.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpression {
    /// One coefficient per variable, in universe order
    pub coefficients: Vec<f64>,
    /// Right-hand side value
    pub constant: f64,
}

impl LinearExpression {
    pub fn new(coefficients: Vec<f64>, constant: f64) -> Self {
        Self { coefficients, constant }
    }

    /// Densify `(coefficient, name)` pairs against `variables`.
    ///
    /// Variables that do not appear get a coefficient of 0. A name listed more
    /// than once contributes the sum of its coefficients.
    pub fn from_terms(
        coefficients: &[f64],
        names: &[String],
        constant: f64,
        variables: &[String],
    ) -> Result<Self, ExpressionError> {
        if coefficients.len() != names.len() {
            return Err(ExpressionError::LengthMismatch {
                expected: names.len(),
                found: coefficients.len(),
            });
        }

        let mut dense = vec![0.0; variables.len()];
        for (&coef, name) in coefficients.iter().zip(names) {
            let idx = variables
                .iter()
                .position(|v| v == name)
                .ok_or_else(|| ExpressionError::UnknownVariable(name.clone()))?;
            dense[idx] += coef;
        }

        Ok(Self::new(dense, constant))
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    /// Multiply both sides by -1
    pub fn negated(&self) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|c| -c).collect(),
            constant: -self.constant,
        }
    }
}

/// Role of a variable injected while turning an inequality into an equality
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedKind {
    /// Added with +1 to a `<=` row
    Slack,
    /// Subtracted from a `>=` row
    Surplus,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InjectedVariable {
    pub name: String,
    pub kind: InjectedKind,
}

impl InjectedVariable {
    /// Coefficient of the variable in the row before any sign flip
    pub fn coefficient(&self) -> f64 {
        match self.kind {
            InjectedKind::Slack => 1.0,
            InjectedKind::Surplus => -1.0,
        }
    }
}

/// A constraint rewritten as an equality over the full variable universe
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StandardConstraint {
    /// Source text, kept for diagnostics
    pub text: String,
    pub relation: Relation,
    pub injected: Option<InjectedVariable>,
    /// Whether the row was multiplied by -1 to make its RHS non-negative
    pub sign_flipped: bool,
    pub equation: LinearExpression,
}

impl StandardConstraint {
    pub fn rhs(&self) -> f64 {
        self.equation.constant
    }
}

/// A problem in standard form, ready to be laid out as a tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct StandardProblem {
    pub direction: Direction,
    /// Name of the objective value, usually `z`
    pub objective_variable: String,
    /// Decision variables followed by slack/surplus variables
    pub variables: Vec<String>,
    /// How many leading entries of `variables` are decision variables
    pub decision_count: usize,
    /// Objective coefficients for the decision variables
    pub objective: Vec<f64>,
    pub constraints: Vec<StandardConstraint>,
}

impl StandardProblem {
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn decision_variables(&self) -> &[String] {
        &self.variables[..self.decision_count]
    }

    /// The variable that starts out basic in each row, if the row has one
    pub fn initial_basis(&self) -> Vec<Option<String>> {
        self.constraints
            .iter()
            .map(|c| c.injected.as_ref().map(|v| v.name.clone()))
            .collect()
    }
}
