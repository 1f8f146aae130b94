mod problem;
mod render;
mod simplex;
mod solution;
mod tableau;

pub use problem::{
    Direction, ExpressionError, InjectedKind, InjectedVariable, LinearExpression, Relation,
    StandardConstraint, StandardProblem,
};
pub use render::{format_value, render_tableau};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus, Step};
pub use tableau::{Tableau, TableauError};
