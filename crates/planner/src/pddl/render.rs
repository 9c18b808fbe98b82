//! Deterministic printer for the planning AST.
//!
//! Output depends only on the AST: identical values always render to
//! byte-identical text.

use std::fmt::{self, Display, Formatter, Write};

use super::ast::{
    ActionSchema, Atom, Domain, Effect, Fact, Formula, PredicateDef, Problem, Term, Typed,
};

/// Writes `a b - t c - u`, grouping consecutive names of the same type.
fn write_grouped(f: &mut Formatter<'_>, items: &[Typed]) -> fmt::Result {
    let mut first = true;
    for (index, item) in items.iter().enumerate() {
        if !first {
            f.write_char(' ')?;
        }
        first = false;
        f.write_str(&item.name)?;
        let last_of_group = items.get(index + 1).is_none_or(|next| next.ty != item.ty);
        if last_of_group {
            write!(f, " - {}", item.ty)?;
        }
    }
    Ok(())
}

/// Writes `?a - t ?b - u`.
fn write_params(f: &mut Formatter<'_>, params: &[Typed]) -> fmt::Result {
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            f.write_char(' ')?;
        }
        write!(f, "?{} - {}", param.name, param.ty)?;
    }
    Ok(())
}

fn write_joined<T: Display>(f: &mut Formatter<'_>, head: &str, parts: &[T]) -> fmt::Result {
    write!(f, "({head}")?;
    for part in parts {
        write!(f, " {part}")?;
    }
    f.write_char(')')
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "?{name}"),
            Term::Const(name) => f.write_str(name),
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.predicate, &self.args)
    }
}

impl Display for Fact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.predicate, &self.args)
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(atom) => atom.fmt(f),
            Formula::Not(inner) => write!(f, "(not {inner})"),
            Formula::And(parts) => write_joined(f, "and", parts),
            Formula::Or(parts) => write_joined(f, "or", parts),
            Formula::Imply(premise, conclusion) => write!(f, "(imply {premise} {conclusion})"),
            Formula::Forall(params, body) => {
                f.write_str("(forall (")?;
                write_params(f, params)?;
                write!(f, ") {body})")
            }
        }
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Add(atom) => atom.fmt(f),
            Effect::Del(atom) => write!(f, "(not {atom})"),
            Effect::And(parts) => write_joined(f, "and", parts),
            Effect::Forall(params, body) => {
                f.write_str("(forall (")?;
                write_params(f, params)?;
                write!(f, ") {body})")
            }
            Effect::When(condition, body) => write!(f, "(when {condition} {body})"),
        }
    }
}

impl Display for PredicateDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.name)?;
        if !self.params.is_empty() {
            f.write_char(' ')?;
            write_params(f, &self.params)?;
        }
        f.write_char(')')
    }
}

impl Display for ActionSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "  (:action {}", self.name)?;
        f.write_str("    :parameters (")?;
        write_params(f, &self.params)?;
        writeln!(f, ")")?;
        writeln!(f, "    :precondition {}", self.precondition)?;
        write!(f, "    :effect {})", self.effect)
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "(define (domain {})", self.name)?;

        f.write_str("  (:requirements")?;
        for requirement in &self.requirements {
            write!(f, " :{requirement}")?;
        }
        writeln!(f, ")")?;

        writeln!(f, "  (:types {})", self.types.join(" "))?;

        if !self.constants.is_empty() {
            f.write_str("  (:constants ")?;
            write_grouped(f, &self.constants)?;
            writeln!(f, ")")?;
        }

        writeln!(f, "  (:predicates")?;
        for predicate in &self.predicates {
            writeln!(f, "    {predicate}")?;
        }
        writeln!(f, "  )")?;

        for action in &self.actions {
            writeln!(f, "{action}")?;
        }
        writeln!(f, ")")
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "(define (problem {})", self.name)?;
        writeln!(f, "  (:domain {})", self.domain)?;

        f.write_str("  (:objects ")?;
        write_grouped(f, &self.objects)?;
        writeln!(f, ")")?;

        writeln!(f, "  (:init")?;
        for fact in &self.init {
            writeln!(f, "    {fact}")?;
        }
        writeln!(f, "  )")?;

        writeln!(f, "  (:goal {})", self.goal)?;
        writeln!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pddl::{Requirement, parse_domain, parse_problem};

    fn sample_domain() -> Domain {
        Domain {
            name: "hallway".into(),
            requirements: vec![Requirement::Strips, Requirement::NegativePreconditions],
            types: vec!["room".into(), "agent".into()],
            constants: vec![Typed::new("lobby", "room"), Typed::new("cellar", "room")],
            predicates: vec![PredicateDef {
                name: "at".into(),
                params: vec![Typed::new("a", "agent"), Typed::new("r", "room")],
            }],
            actions: vec![ActionSchema {
                name: "leave".into(),
                params: vec![Typed::new("a", "agent")],
                precondition: Formula::atom("at", [Term::var("a"), Term::constant("lobby")]),
                effect: Effect::forall(
                    vec![Typed::new("r", "room")],
                    Effect::del("at", [Term::var("a"), Term::var("r")]),
                ),
            }],
        }
    }

    #[test]
    fn renders_grouped_constants_and_parameters() {
        let text = sample_domain().to_string();
        assert!(text.contains("(:requirements :strips :negative-preconditions)"));
        assert!(text.contains("(:constants lobby cellar - room)"));
        assert!(text.contains("(at ?a - agent ?r - room)"));
        assert!(text.contains(":effect (forall (?r - room) (not (at ?a ?r))))"));
    }

    #[test]
    fn rendered_text_parses_back() {
        let domain = sample_domain();
        assert_eq!(parse_domain(&domain.to_string()).unwrap(), domain);

        let problem = Problem {
            name: "p".into(),
            domain: "hallway".into(),
            objects: vec![Typed::new("me", "agent")],
            init: vec![Fact::new("at", ["me", "lobby"])],
            goal: Formula::And(vec![Formula::not(Formula::atom(
                "at",
                [Term::constant("me"), Term::constant("lobby")],
            ))]),
        };
        assert_eq!(parse_problem(&problem.to_string()).unwrap(), problem);
    }
}
