//! Planning-language AST, reader and printer.

mod ast;
mod parse;
mod render;
pub mod sexpr;

pub use ast::{
    ActionSchema, Atom, Domain, Effect, Fact, Formula, PredicateDef, Problem, Requirement, Term,
    Typed,
};
pub use parse::{ParseError, parse_domain, parse_problem};
