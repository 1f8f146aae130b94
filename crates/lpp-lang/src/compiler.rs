use lpp_solver::{
    ExpressionError, InjectedKind, InjectedVariable, LinearExpression, Relation, StandardConstraint,
    StandardProblem,
};
use thiserror::Error;
use tracing::debug;

use crate::ast::*;
use crate::parser::ParseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Problem has no objective line")]
    EmptyProblem,
    #[error("Malformed objective `{line}`: {source}")]
    MalformedObjective { line: String, source: ParseError },
    #[error("Malformed constraint `{line}`: {source}")]
    MalformedConstraint { line: String, source: ParseError },
    #[error("Invalid expression in `{line}`: {source}")]
    InvalidExpression { line: String, source: ExpressionError },
}

/// Name for a new slack/surplus variable: `s` followed by the numeric suffix of
/// the last variable plus one, or by `len + 1` when it has no suffix. Names
/// already in use are skipped.
pub fn next_slack_name(variables: &[String]) -> String {
    let suffix = variables.last().and_then(|last| {
        let digits_at = last.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        last[digits_at..].parse::<usize>().ok()
    });
    let mut k = match suffix {
        Some(n) => n + 1,
        None => variables.len() + 1,
    };
    loop {
        let name = format!("s{}", k);
        if !variables.contains(&name) {
            return name;
        }
        k += 1;
    }
}

/// Turns parsed objective and constraint lines into a standard-form problem.
///
/// The variable universe is fixed before any row is built: decision variables
/// in first-seen order (objective, then constraints), followed by one slack or
/// surplus variable per constraint that gets one, in constraint order. Every
/// row is then built at full width.
pub struct Compiler {
    variables: Vec<String>,
    decision_count: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            decision_count: 0,
        }
    }

    pub fn compile(
        objective: &ObjectiveLine,
        constraints: &[ConstraintLine],
    ) -> Result<StandardProblem, CompileError> {
        let mut compiler = Compiler::new();
        compiler.collect_decision_variables(objective, constraints);

        let kept: Vec<&ConstraintLine> = constraints
            .iter()
            .filter(|c| {
                if c.is_nonnegativity_bound() {
                    debug!(
                        component = "compiler",
                        constraint = %c.text,
                        "Dropping bound already implied by non-negativity"
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        let injected: Vec<Option<InjectedVariable>> =
            kept.iter().map(|c| compiler.inject_variable(c)).collect();

        let objective_coefficients = LinearExpression::from_terms(
            &objective.expr.coefficients(),
            &objective.expr.variables(),
            0.0,
            &compiler.variables[..compiler.decision_count],
        )
        .map_err(|source| CompileError::InvalidExpression {
            line: objective.to_string(),
            source,
        })?
        .coefficients;

        let standard = kept
            .iter()
            .zip(injected)
            .map(|(c, injected)| compiler.normalize(c, injected))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            component = "compiler",
            operation = "compile",
            variables = compiler.variables.len(),
            decision_variables = compiler.decision_count,
            constraints = standard.len(),
            "Compiled problem to standard form"
        );

        Ok(StandardProblem {
            direction: objective.direction,
            objective_variable: objective.variable.clone(),
            variables: compiler.variables,
            decision_count: compiler.decision_count,
            objective: objective_coefficients,
            constraints: standard,
        })
    }

    fn collect_decision_variables(&mut self, objective: &ObjectiveLine, constraints: &[ConstraintLine]) {
        let terms = objective
            .expr
            .terms
            .iter()
            .chain(constraints.iter().flat_map(|c| c.lhs.terms.iter()));
        for term in terms {
            if !self.variables.contains(&term.variable) {
                self.variables.push(term.variable.clone());
            }
        }
        self.decision_count = self.variables.len();
    }

    /// Register the slack or surplus variable a constraint needs, if any
    fn inject_variable(&mut self, constraint: &ConstraintLine) -> Option<InjectedVariable> {
        let kind = match constraint.relation {
            Relation::Le => InjectedKind::Slack,
            Relation::Ge if constraint.rhs < 0.0 => InjectedKind::Surplus,
            Relation::Ge => {
                debug!(
                    component = "compiler",
                    constraint = %constraint.text,
                    "No slack variable for >= constraint with non-negative right-hand side"
                );
                return None;
            }
            Relation::Eq => return None,
        };

        let name = next_slack_name(&self.variables);
        self.variables.push(name.clone());
        match kind {
            InjectedKind::Slack => debug!(
                component = "compiler",
                variable = %name,
                constraint = %constraint.text,
                "Adding slack variable to <= constraint"
            ),
            InjectedKind::Surplus => debug!(
                component = "compiler",
                variable = %name,
                constraint = %constraint.text,
                "Adding surplus variable and multiplying by -1 since the right-hand side is negative"
            ),
        }
        Some(InjectedVariable { name, kind })
    }

    fn normalize(
        &self,
        constraint: &ConstraintLine,
        injected: Option<InjectedVariable>,
    ) -> Result<StandardConstraint, CompileError> {
        let mut coefficients = constraint.lhs.coefficients();
        let mut names = constraint.lhs.variables();
        if let Some(var) = &injected {
            coefficients.push(var.coefficient());
            names.push(var.name.clone());
        }

        let equation = LinearExpression::from_terms(&coefficients, &names, constraint.rhs, &self.variables)
            .map_err(|source| CompileError::InvalidExpression {
                line: constraint.text.clone(),
                source,
            })?;

        let sign_flipped = matches!(
            injected,
            Some(InjectedVariable {
                kind: InjectedKind::Surplus,
                ..
            })
        );
        let equation = if sign_flipped { equation.negated() } else { equation };

        Ok(StandardConstraint {
            text: constraint.text.clone(),
            relation: constraint.relation,
            injected,
            sign_flipped,
            equation,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use lpp_solver::Direction;

    fn compile(objective: &str, constraints: &[&str]) -> StandardProblem {
        let objective = Parser::parse_objective(objective).unwrap();
        let constraints: Vec<_> = constraints
            .iter()
            .map(|c| Parser::parse_constraint(c).unwrap())
            .collect();
        Compiler::compile(&objective, &constraints).unwrap()
    }

    #[test]
    fn test_slack_names_follow_last_suffix() {
        let vars = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(next_slack_name(&vars(&["x1", "x2"])), "s3");
        assert_eq!(next_slack_name(&vars(&["x1", "x2", "s3"])), "s4");
        assert_eq!(next_slack_name(&vars(&["x_1", "x_12"])), "s13");
        assert_eq!(next_slack_name(&vars(&["a", "b"])), "s3");
        assert_eq!(next_slack_name(&vars(&["s2", "x1"])), "s3");
        assert_eq!(next_slack_name(&vars(&["x1", "s2"])), "s3");
        assert_eq!(next_slack_name(&[]), "s1");
    }

    #[test]
    fn test_le_gets_slack_with_plus_one() {
        let problem = compile("Maximize: z = 5x1 + 4x2", &["6x1 + 4x2 <= 24", "x1 + 2x2 <= 6"]);

        assert_eq!(problem.variables, vec!["x1", "x2", "s3", "s4"]);
        assert_eq!(problem.decision_count, 2);
        assert_eq!(problem.objective, vec![5.0, 4.0]);
        assert_eq!(problem.direction, Direction::Maximize);

        let first = &problem.constraints[0];
        assert_eq!(first.equation.coefficients, vec![6.0, 4.0, 1.0, 0.0]);
        assert_eq!(first.rhs(), 24.0);
        assert!(!first.sign_flipped);
        let injected = first.injected.as_ref().unwrap();
        assert_eq!(injected.name, "s3");
        assert_eq!(injected.kind, InjectedKind::Slack);
        assert_eq!(injected.coefficient(), 1.0);

        let second = &problem.constraints[1];
        assert_eq!(second.equation.coefficients, vec![1.0, 2.0, 0.0, 1.0]);
        assert_eq!(problem.initial_basis(), vec![Some("s3".to_string()), Some("s4".to_string())]);
    }

    #[test]
    fn test_ge_with_negative_rhs_is_flipped() {
        let problem = compile("Maximize: z = x1 + x2", &["-x1 - x2 >= -5"]);

        let row = &problem.constraints[0];
        let injected = row.injected.as_ref().unwrap();
        assert_eq!(injected.kind, InjectedKind::Surplus);
        assert_eq!(injected.coefficient(), -1.0);
        assert!(row.sign_flipped);
        assert_eq!(row.equation.coefficients, vec![1.0, 1.0, 1.0]);
        assert_eq!(row.rhs(), 5.0);
        assert!(row.rhs() >= 0.0);
    }

    #[test]
    fn test_ge_with_non_negative_rhs_is_left_alone() {
        let problem = compile("Minimize: z = x1 + x2", &["x1 + x2 >= 2"]);

        let row = &problem.constraints[0];
        assert!(row.injected.is_none());
        assert!(!row.sign_flipped);
        assert_eq!(row.equation.coefficients, vec![1.0, 1.0]);
        assert_eq!(problem.initial_basis(), vec![None]);
    }

    #[test]
    fn test_equality_gets_no_variable() {
        let problem = compile("Maximize: z = x1", &["x1 + x2 = 4", "x1 <= 3"]);

        assert_eq!(problem.variables, vec!["x1", "x2", "s3"]);
        assert!(problem.constraints[0].injected.is_none());
        assert_eq!(problem.constraints[0].equation.coefficients, vec![1.0, 1.0, 0.0]);
        assert_eq!(problem.constraints[1].equation.coefficients, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_every_row_has_full_width() {
        let problem = compile(
            "Maximize: z = x1 + 2x2 + 3x3",
            &["x1 <= 1", "x2 + x4 <= 2", "x3 = 1", "-x1 >= -3", "x2 <= 5"],
        );

        // x4 only appears in a constraint but is still a decision variable
        assert_eq!(problem.decision_variables(), &["x1", "x2", "x3", "x4"]);
        assert_eq!(problem.variables, vec!["x1", "x2", "x3", "x4", "s5", "s6", "s7", "s8"]);
        assert_eq!(problem.objective, vec![1.0, 2.0, 3.0, 0.0]);
        for row in &problem.constraints {
            assert_eq!(row.equation.width(), problem.num_variables(), "{}", row.text);
        }
        // the earliest row still carries zero columns for later slacks
        assert_eq!(
            problem.constraints[0].equation.coefficients,
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_nonnegativity_bounds_are_dropped() {
        let problem = compile("Maximize: z = 5x1 + 4x2", &["6x1 + 4x2 <= 24", "x1 >= 0", "x2 >= 0"]);

        assert_eq!(problem.num_constraints(), 1);
        assert_eq!(problem.variables, vec!["x1", "x2", "s3"]);
    }

    #[test]
    fn test_objective_with_repeated_variable() {
        let problem = compile("Maximize: z = x1 + x2 + x1", &["x1 <= 1"]);
        assert_eq!(problem.objective, vec![2.0, 1.0]);
    }
}
