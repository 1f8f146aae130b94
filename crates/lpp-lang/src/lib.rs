pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod reader;

pub use ast::*;
pub use compiler::{next_slack_name, CompileError, Compiler};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use model::{Lpp, LppError};
pub use parser::{parse_linear_terms, ParseError, Parser};
pub use reader::{read_problems, ProblemBlock};
