use crate::problem::Direction;
use crate::tableau::Tableau;

/// How the pivot loop ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// No entering variable improves the objective
    Optimal,
    /// Two basic optimal solutions with the same objective value were found
    AlternateOptima,
    /// No variable can leave; the objective grows without limit
    Unbounded,
    /// A basic variable was zero at two consecutive iterations
    Degenerate,
    /// The iteration limit was reached before any other classification
    NonConvergent,
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "OPTIMAL"),
            SolutionStatus::AlternateOptima => write!(f, "ALTERNATE OPTIMA"),
            SolutionStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolutionStatus::Degenerate => write!(f, "DEGENERATE"),
            SolutionStatus::NonConvergent => write!(f, "NON-CONVERGENT"),
        }
    }
}

/// The result of running the simplex method on one problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub direction: Direction,
    /// Variable names, decision variables first
    pub variables: Vec<String>,
    /// How many leading entries of `variables` are decision variables
    pub decision_count: usize,
    /// Value of each variable at the last basic solution read
    pub values: Vec<f64>,
    /// First basic optimum, set only when alternate optima were found
    pub alternate_values: Option<Vec<f64>>,
    /// Objective value (z)
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
    /// Objective value read at the start of every iteration
    pub history: Vec<f64>,
    /// Tableau as it was when the loop stopped
    pub tableau: Tableau,
    /// Per-iteration record, populated when tracing is enabled on the solver
    pub steps: Vec<Step>,
}

/// Snapshot of one iteration of the pivot loop
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Step {
    pub iteration: usize,
    /// Tableau before the pivot
    pub tableau: Tableau,
    pub objective_value: f64,
    pub values: Vec<f64>,
    pub entering: Option<String>,
    pub leaving: Option<String>,
    /// `rhs / a` per constraint row, `None` where `a` is not positive
    pub ratios: Vec<Option<f64>>,
    pub pivot: Option<f64>,
}

impl Solution {
    pub fn degenerate(&self) -> bool {
        self.status == SolutionStatus::Degenerate
    }

    pub fn unbounded(&self) -> bool {
        self.status == SolutionStatus::Unbounded
    }

    pub fn alternate_optima_exists(&self) -> bool {
        self.status == SolutionStatus::AlternateOptima
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        let idx = self.variables.iter().position(|v| v == name)?;
        self.values.get(idx).copied()
    }

    pub fn alternate_value_of(&self, name: &str) -> Option<f64> {
        let idx = self.variables.iter().position(|v| v == name)?;
        self.alternate_values.as_ref()?.get(idx).copied()
    }

    /// `(name, value)` pairs in variable order
    pub fn assignments(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// `(name, value)` pairs of the first optimum when alternate optima exist
    pub fn alternate_assignments(&self) -> impl Iterator<Item = (&str, f64)> {
        let values = self.alternate_values.as_deref().unwrap_or(&[]);
        self.variables
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
    }
}
