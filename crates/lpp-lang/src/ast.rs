use std::fmt;

use lpp_solver::{Direction, Relation};

use crate::lexer::Span;

/// A single `coefficient * variable` term
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub span: Span,
    pub coefficient: f64,
    pub variable: String,
}

/// A sum of terms such as `5x1 - x2 + 0.5x3`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearTerms {
    pub terms: Vec<Term>,
}

impl LinearTerms {
    pub fn coefficients(&self) -> Vec<f64> {
        self.terms.iter().map(|t| t.coefficient).collect()
    }

    pub fn variables(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.variable.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for LinearTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            let magnitude = term.coefficient.abs();
            let sign = if term.coefficient < 0.0 { "-" } else { "+" };
            match (i, sign) {
                (0, "+") => {}
                (0, _) => write!(f, "-")?,
                _ => write!(f, " {} ", sign)?,
            }
            if magnitude != 1.0 {
                write!(f, "{}", magnitude)?;
            }
            write!(f, "{}", term.variable)?;
        }
        Ok(())
    }
}

/// `Maximize: z = 5x1 + 4x2`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveLine {
    pub span: Span,
    pub direction: Direction,
    /// Name on the left of `=`, usually `z`
    pub variable: String,
    pub expr: LinearTerms,
}

impl fmt::Display for ObjectiveLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.direction, self.variable, self.expr)
    }
}

/// `6x1 + 4x2 <= 24`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintLine {
    pub span: Span,
    /// Source text as written
    pub text: String,
    pub lhs: LinearTerms,
    pub relation: Relation,
    pub rhs: f64,
}

impl ConstraintLine {
    /// `x >= 0` for a single variable with a positive coefficient
    pub fn is_nonnegativity_bound(&self) -> bool {
        self.relation == Relation::Ge
            && self.rhs == 0.0
            && self.lhs.len() == 1
            && self.lhs.terms[0].coefficient > 0.0
    }
}

impl fmt::Display for ConstraintLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.relation, self.rhs)
    }
}
