use std::fmt;

use lpp_solver::{Solution, Solver, StandardProblem, TableauError};
use thiserror::Error;
use tracing::debug;

use crate::ast::{ConstraintLine, ObjectiveLine};
use crate::compiler::{CompileError, Compiler};
use crate::parser::Parser;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LppError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Tableau(#[from] TableauError),
}

/// One linear programming problem: the text it came from and its standard form
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Lpp {
    pub objective: ObjectiveLine,
    pub constraints: Vec<ConstraintLine>,
    pub problem: StandardProblem,
}

impl Lpp {
    /// Parse an objective line followed by constraint lines
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, CompileError> {
        let (first, rest) = lines.split_first().ok_or(CompileError::EmptyProblem)?;
        let first = first.as_ref();

        let objective = Parser::parse_objective(first).map_err(|source| CompileError::MalformedObjective {
            line: first.trim().to_string(),
            source,
        })?;

        let constraints = rest
            .iter()
            .map(|line| {
                let line = line.as_ref();
                Parser::parse_constraint(line).map_err(|source| CompileError::MalformedConstraint {
                    line: line.trim().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let problem = Compiler::compile(&objective, &constraints)?;

        Ok(Self {
            objective,
            constraints,
            problem,
        })
    }

    /// Run the simplex method on this problem
    pub fn solve(&self, solver: &Solver) -> Result<Solution, LppError> {
        let solution = solver.solve(&self.problem)?;
        debug!(
            component = "lpp",
            objective = %self.objective,
            status = %solution.status,
            iterations = solution.iterations,
            z = solution.objective_value,
            "Solved problem"
        );
        Ok(solution)
    }
}

impl fmt::Display for Lpp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.objective)?;
        write!(f, "Subject to:")?;
        for constraint in &self.constraints {
            write!(f, "\n\t{}", constraint.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_problems;
    use lpp_solver::SolutionStatus;

    fn solve(lines: &[&str]) -> Solution {
        Lpp::from_lines(lines).unwrap().solve(&Solver::new()).unwrap()
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!((actual - expected).abs() < 1e-6, "{} (expected {})", actual, expected);
    }

    #[test]
    fn test_production_plan() {
        let solution = solve(&["Maximize: z = 5x1 + 4x2", "6x1 + 4x2 <= 24", "x1 + 2x2 <= 6"]);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.value_of("x1"), 3.0);
        assert_close(solution.value_of("x2"), 1.5);
        assert_close(Some(solution.objective_value), 21.0);
    }

    #[test]
    fn test_fractional_optimum() {
        let solution = solve(&["Maximize: z = 3x1 + 2x2", "x1 <= 4", "x1 + 3x2 <= 6"]);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(!solution.unbounded());
        assert_close(solution.value_of("x1"), 4.0);
        assert_close(solution.value_of("x2"), 2.0 / 3.0);
        assert_close(Some(solution.objective_value), 40.0 / 3.0);
    }

    #[test]
    fn test_unbounded() {
        let solution = solve(&["Maximize: z = x1", "x1 - x2 <= 1"]);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.unbounded());
        // one successful pivot on x1, then x2 has no positive ratio
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_alternate_optima() {
        let solution = solve(&["Maximize: z = 2x1 + 4x2", "x1 + 2x2 <= 5", "x1 + x2 <= 4"]);

        assert_eq!(solution.status, SolutionStatus::AlternateOptima);
        assert!(solution.alternate_optima_exists());

        let first: Vec<(&str, f64)> = solution.alternate_assignments().collect();
        let second: Vec<(&str, f64)> = solution.assignments().collect();
        assert_ne!(first, second);

        let z = |point: &[(&str, f64)]| {
            point
                .iter()
                .map(|&(name, value)| match name {
                    "x1" => 2.0 * value,
                    "x2" => 4.0 * value,
                    _ => 0.0,
                })
                .sum::<f64>()
        };
        assert!((z(&first) - 10.0).abs() < 1e-6);
        assert!((z(&second) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_surplus_row_with_negative_rhs() {
        // -x1 - x2 >= -4 is x1 + x2 <= 4
        let solution = solve(&["Maximize: z = x1 + 3x2", "-x1 - x2 >= -4", "x2 <= 3"]);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.value_of("x1"), 1.0);
        assert_close(solution.value_of("x2"), 3.0);
        assert_close(Some(solution.objective_value), 10.0);
    }

    #[test]
    fn test_equality_needs_phase_one() {
        let lpp = Lpp::from_lines(&["Maximize: z = x1", "x1 + x2 = 4"]).unwrap();
        let err = lpp.solve(&Solver::new()).unwrap_err();
        assert!(matches!(
            err,
            LppError::Tableau(TableauError::MissingBasicVariable { row: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_constraint() {
        let err = Lpp::from_lines(&["Maximize: z = x1", "x1 + x2 4"]).unwrap_err();
        assert!(matches!(err, CompileError::MalformedConstraint { ref line, .. } if line == "x1 + x2 4"));
    }

    #[test]
    fn test_malformed_objective() {
        let err = Lpp::from_lines(&["Maximise z = x1"]).unwrap_err();
        assert!(matches!(err, CompileError::MalformedObjective { .. }));
    }

    #[test]
    fn test_empty_problem() {
        let lines: [&str; 0] = [];
        assert_eq!(Lpp::from_lines(&lines).unwrap_err(), CompileError::EmptyProblem);
    }

    #[test]
    fn test_display_restates_problem() {
        let lpp = Lpp::from_lines(&["Maximize: z = 5x1 + 4x2", "6x1 + 4x2 <= 24", "x1 >= 0"]).unwrap();
        assert_eq!(
            lpp.to_string(),
            "Maximize: z = 5x1 + 4x2\nSubject to:\n\t6x1 + 4x2 <= 24\n\tx1 >= 0"
        );
    }

    #[test]
    fn test_batch_continues_after_bad_problem() {
        let source = "\
Maximize: z = 5x1 + 4x2
6x1 + 4x2 <= 24
x1 + 2x2 <= 6

Maximize: z = x1
x1 x2

Maximize: z = x1
x1 - x2 <= 1
";
        let results: Vec<_> = read_problems(source)
            .iter()
            .map(|block| {
                Lpp::from_lines(&block.lines)
                    .map_err(LppError::from)
                    .and_then(|lpp| lpp.solve(&Solver::new()))
            })
            .collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().status, SolutionStatus::Optimal);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_statuses_are_exclusive() {
        let problems: [&[&str]; 4] = [
            &["Maximize: z = 5x1 + 4x2", "6x1 + 4x2 <= 24", "x1 + 2x2 <= 6"],
            &["Maximize: z = x1", "x1 - x2 <= 1"],
            &["Maximize: z = 2x1 + 4x2", "x1 + 2x2 <= 5", "x1 + x2 <= 4"],
            &["Maximize: z = x1 + x2", "x2 <= 0", "x1 <= 4"],
        ];
        for lines in problems {
            let solution = solve(lines);
            let flags = [
                solution.status == SolutionStatus::Optimal,
                solution.unbounded(),
                solution.degenerate(),
                solution.alternate_optima_exists(),
            ];
            assert_eq!(flags.iter().filter(|&&f| f).count(), 1, "{:?}", solution.status);
            assert_eq!(solution.alternate_values.is_some(), solution.alternate_optima_exists());
        }
    }
}
