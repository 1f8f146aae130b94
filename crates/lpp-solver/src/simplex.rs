use tracing::{debug, trace};

use crate::problem::{Direction, StandardProblem};
use crate::solution::{Solution, SolutionStatus, Step};
use crate::tableau::{Tableau, TableauError};

/// Tabular simplex solver for problems whose origin is a basic feasible solution
pub struct Solver {
    /// Maximum iterations before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Record a `Step` for every iteration
    trace: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            trace: false,
        }
    }
}

/// Outcome of scanning the objective row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entering {
    Found(usize),
    /// Zero reduced cost on a non-basic column: another optimum is one pivot away
    AlternateOptimaCandidate(usize),
    Optimal,
}

/// Outcome of the minimum ratio test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaving {
    Found(usize),
    Unbounded,
}

/// Mutable state of one pass of the pivot loop
struct PivotRun {
    tableau: Tableau,
    direction: Direction,
    decision_count: usize,
    history: Vec<f64>,
    steps: Vec<Step>,
    alternate: Option<Vec<f64>>,
    iterations: usize,
}

impl PivotRun {
    fn finish(self, status: SolutionStatus, values: Vec<f64>) -> Solution {
        let alternate_values = match status {
            SolutionStatus::AlternateOptima => self.alternate,
            _ => None,
        };
        Solution {
            status,
            direction: self.direction,
            variables: self.tableau.variables().to_vec(),
            decision_count: self.decision_count,
            values,
            alternate_values,
            objective_value: self.tableau.objective_value(),
            iterations: self.iterations,
            history: self.history,
            tableau: self.tableau,
            steps: self.steps,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Build the initial tableau for `problem` and pivot it to a terminal state
    pub fn solve(&self, problem: &StandardProblem) -> Result<Solution, TableauError> {
        let tableau = Tableau::build(problem)?;
        debug!(
            component = "solver",
            operation = "build",
            direction = %problem.direction,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "Built initial tableau"
        );
        Ok(self.run(tableau, problem.direction, problem.decision_count))
    }

    /// Pivot an already built tableau until a terminal state is reached
    pub fn run(&self, tableau: Tableau, direction: Direction, decision_count: usize) -> Solution {
        let mut run = PivotRun {
            tableau,
            direction,
            decision_count,
            history: Vec::new(),
            steps: Vec::new(),
            alternate: None,
            iterations: 0,
        };
        let mut potentially_degenerate = false;

        for iteration in 0..self.max_iterations {
            let values = run.tableau.basic_values();
            let z = run.tableau.objective_value();
            run.history.push(z);

            let mut step = self.trace.then(|| Step {
                iteration,
                tableau: run.tableau.clone(),
                objective_value: z,
                values: values.clone(),
                entering: None,
                leaving: None,
                ratios: Vec::new(),
                pivot: None,
            });

            // A basic variable at zero twice in a row means we are stalling
            if let Some(name) = self.zero_basic_variable(&run.tableau) {
                if potentially_degenerate {
                    debug!(
                        component = "solver",
                        iteration,
                        variable = name,
                        "Basic variable is zero at two consecutive iterations"
                    );
                    run.steps.extend(step);
                    return run.finish(SolutionStatus::Degenerate, values);
                }
                debug!(
                    component = "solver",
                    iteration,
                    variable = name,
                    "Basic variable is zero, solution is potentially degenerate"
                );
                potentially_degenerate = true;
            } else {
                potentially_degenerate = false;
            }

            let pivot_col = match self.find_pivot_column(&run.tableau, direction, run.alternate.is_some()) {
                Entering::Found(col) => col,
                Entering::AlternateOptimaCandidate(col) => {
                    debug!(
                        component = "solver",
                        iteration,
                        variable = run.tableau.variable_at(col),
                        "Non-basic variable has a zero objective coefficient, searching for a second optimum"
                    );
                    run.alternate = Some(values.clone());
                    col
                }
                Entering::Optimal => {
                    let status = if run.alternate.is_some() {
                        SolutionStatus::AlternateOptima
                    } else {
                        SolutionStatus::Optimal
                    };
                    debug!(component = "solver", iteration, z, status = %status, "Reached optimum");
                    run.steps.extend(step);
                    return run.finish(status, values);
                }
            };
            let entering = run.tableau.variable_at(pivot_col).to_string();

            let ratios = self.ratios(&run.tableau, pivot_col);
            for (i, ratio) in ratios.iter().enumerate() {
                trace!(component = "solver", iteration, row = i + 1, ratio = ?ratio, "Ratio");
            }
            if let Some(step) = step.as_mut() {
                step.entering = Some(entering.clone());
                step.ratios = ratios.clone();
            }

            let pivot_row = match self.find_pivot_row(&ratios) {
                Leaving::Found(row) => row,
                Leaving::Unbounded => {
                    run.steps.extend(step);
                    // The candidate direction keeps z constant, so the optimum stands
                    if run.alternate.take().is_some() {
                        debug!(
                            component = "solver",
                            iteration,
                            variable = %entering,
                            "No positive ratio along a zero-cost direction, keeping the optimum"
                        );
                        return run.finish(SolutionStatus::Optimal, values);
                    }
                    debug!(
                        component = "solver",
                        iteration,
                        variable = %entering,
                        "No positive ratio, feasible region is unbounded"
                    );
                    return run.finish(SolutionStatus::Unbounded, values);
                }
            };

            let leaving = run.tableau.basis()[pivot_row - 1].clone();
            let pivot_val = run.tableau.get(pivot_row, pivot_col);
            debug!(
                component = "solver",
                iteration,
                z,
                entering = %entering,
                leaving = %leaving,
                pivot = pivot_val,
                "Pivoting"
            );
            if let Some(mut step) = step {
                step.leaving = Some(leaving);
                step.pivot = Some(pivot_val);
                run.steps.push(step);
            }

            run.tableau.pivot(pivot_row, pivot_col);
            run.iterations += 1;
        }

        debug!(
            component = "solver",
            max_iterations = self.max_iterations,
            "Iteration limit reached"
        );
        run.history.push(run.tableau.objective_value());
        let values = run.tableau.basic_values();
        run.finish(SolutionStatus::NonConvergent, values)
    }

    fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.tolerance
    }

    fn zero_basic_variable<'t>(&self, tableau: &'t Tableau) -> Option<&'t str> {
        tableau
            .basis()
            .iter()
            .enumerate()
            .find(|(i, _)| self.is_zero(tableau.rhs(i + 1)))
            .map(|(_, name)| name.as_str())
    }

    /// Dantzig's rule: the most negative objective entry when maximizing, the
    /// most positive when minimizing. Ties go to the leftmost column.
    fn find_pivot_column(&self, tableau: &Tableau, direction: Direction, alternate_seen: bool) -> Entering {
        let objective = &tableau.row(0)[1..tableau.rhs_col()];
        if objective.is_empty() {
            return Entering::Optimal;
        }

        let mut best = 0;
        for (j, &value) in objective.iter().enumerate().skip(1) {
            let better = match direction {
                Direction::Maximize => value < objective[best],
                Direction::Minimize => value > objective[best],
            };
            if better {
                best = j;
            }
        }

        let value = objective[best];
        let col = best + 1;
        let improving = match direction {
            Direction::Maximize => value < -self.tolerance,
            Direction::Minimize => value > self.tolerance,
        };

        if improving {
            Entering::Found(col)
        } else if !alternate_seen && self.is_zero(value) && !tableau.is_basic(tableau.variable_at(col)) {
            Entering::AlternateOptimaCandidate(col)
        } else {
            Entering::Optimal
        }
    }

    /// `rhs / a` for every constraint row where the pivot column entry is positive
    fn ratios(&self, tableau: &Tableau, col: usize) -> Vec<Option<f64>> {
        (1..tableau.num_rows())
            .map(|i| {
                let val = tableau.get(i, col);
                (val > self.tolerance).then(|| tableau.rhs(i) / val)
            })
            .collect()
    }

    /// Smallest strictly positive ratio; the first row wins a tie
    fn find_pivot_row(&self, ratios: &[Option<f64>]) -> Leaving {
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, ratio) in ratios.iter().enumerate() {
            let Some(ratio) = *ratio else {
                continue;
            };
            if ratio > self.tolerance && ratio < min_ratio {
                min_ratio = ratio;
                min_row = Some(i + 1);
            }
        }

        match min_row {
            Some(row) => Leaving::Found(row),
            None => Leaving::Unbounded,
        }
    }
}
