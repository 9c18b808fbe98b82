use std::str::FromStr;

use super::ast::{
    ActionSchema, Atom, Domain, Effect, Fact, Formula, PredicateDef, Problem, Requirement, Term,
    Typed,
};
use super::sexpr::{self, SExpr};

/// Errors raised while reading planning text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("input is empty")]
    Empty,

    #[error("unexpected ')' on line {line}")]
    UnbalancedClose { line: usize },

    #[error("list opened on line {line} is never closed")]
    Unterminated { line: usize },

    #[error("expected a single expression, found {found}")]
    TrailingInput { found: usize },

    #[error("expected {expected}, found `{found}`")]
    Unexpected {
        expected: &'static str,
        found: String,
    },

    #[error("unsupported requirement `{0}`")]
    UnknownRequirement(String),

    #[error("plan line {line} is not an action application: `{text}`")]
    InvalidPlanLine { line: usize, text: String },
}

fn unexpected(expected: &'static str, found: &SExpr) -> ParseError {
    ParseError::Unexpected {
        expected,
        found: render_sexpr(found),
    }
}

fn render_sexpr(expr: &SExpr) -> String {
    match expr {
        SExpr::Atom(atom) => atom.clone(),
        SExpr::List(items) => {
            let inner: Vec<_> = items.iter().map(render_sexpr).collect();
            format!("({})", inner.join(" "))
        }
    }
}

fn atom<'a>(expr: &'a SExpr, expected: &'static str) -> Result<&'a str, ParseError> {
    expr.as_atom().ok_or_else(|| unexpected(expected, expr))
}

fn list<'a>(expr: &'a SExpr, expected: &'static str) -> Result<&'a [SExpr], ParseError> {
    expr.as_list().ok_or_else(|| unexpected(expected, expr))
}

/// Splits `(define (<kind> <name>) sections...)` into name and sections.
fn definition<'a>(expr: &'a SExpr, kind: &'static str) -> Result<(&'a str, &'a [SExpr]), ParseError> {
    let items = list(expr, "a (define ...) form")?;
    match items {
        [SExpr::Atom(define), header, sections @ ..] if define == "define" => {
            match list(header, "a definition header")? {
                [SExpr::Atom(k), SExpr::Atom(name)] if k == kind => Ok((name.as_str(), sections)),
                _ => Err(unexpected(kind, header)),
            }
        }
        _ => Err(unexpected("a (define ...) form", expr)),
    }
}

/// Parses `a b - t c - u d` into typed names; untyped trailing names are `object`.
fn typed_list(items: &[SExpr], variables: bool) -> Result<Vec<Typed>, ParseError> {
    let mut typed = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut iter = items.iter();

    while let Some(item) = iter.next() {
        let name = atom(item, "a name")?;
        if name == "-" {
            let ty = iter
                .next()
                .ok_or(ParseError::Unexpected {
                    expected: "a type after `-`",
                    found: String::new(),
                })
                .and_then(|ty| atom(ty, "a type name"))?;
            typed.extend(pending.drain(..).map(|name| Typed::new(name, ty)));
            continue;
        }
        let name = if variables {
            name.strip_prefix('?')
                .ok_or_else(|| unexpected("a variable", item))?
        } else {
            name
        };
        pending.push(name.to_owned());
    }
    typed.extend(pending.into_iter().map(|name| Typed::new(name, "object")));
    Ok(typed)
}

fn term(expr: &SExpr) -> Result<Term, ParseError> {
    let name = atom(expr, "a term")?;
    Ok(match name.strip_prefix('?') {
        Some(var) => Term::var(var),
        None => Term::constant(name),
    })
}

fn parse_atom(items: &[SExpr]) -> Result<Atom, ParseError> {
    let (head, args) = items.split_first().ok_or(ParseError::Unexpected {
        expected: "a predicate",
        found: "()".into(),
    })?;
    Ok(Atom {
        predicate: atom(head, "a predicate name")?.to_owned(),
        args: args.iter().map(term).collect::<Result<_, _>>()?,
    })
}

pub(crate) fn formula(expr: &SExpr) -> Result<Formula, ParseError> {
    let items = list(expr, "a formula")?;
    let Some((head, rest)) = items.split_first() else {
        return Ok(Formula::And(Vec::new()));
    };
    match (head.as_atom(), rest) {
        (Some("and"), parts) => Ok(Formula::And(parts.iter().map(formula).collect::<Result<_, _>>()?)),
        (Some("or"), parts) => Ok(Formula::Or(parts.iter().map(formula).collect::<Result<_, _>>()?)),
        (Some("not"), [inner]) => Ok(Formula::not(formula(inner)?)),
        (Some("imply"), [premise, conclusion]) => {
            Ok(Formula::imply(formula(premise)?, formula(conclusion)?))
        }
        (Some("forall"), [params, body]) => Ok(Formula::forall(
            typed_list(list(params, "a parameter list")?, true)?,
            formula(body)?,
        )),
        (Some("not" | "imply" | "forall"), _) => Err(unexpected("a well-formed connective", expr)),
        _ => Ok(Formula::Atom(parse_atom(items)?)),
    }
}

fn effect(expr: &SExpr) -> Result<Effect, ParseError> {
    let items = list(expr, "an effect")?;
    let Some((head, rest)) = items.split_first() else {
        return Ok(Effect::And(Vec::new()));
    };
    match (head.as_atom(), rest) {
        (Some("and"), parts) => Ok(Effect::And(parts.iter().map(effect).collect::<Result<_, _>>()?)),
        (Some("not"), [inner]) => Ok(Effect::Del(parse_atom(list(inner, "an atom")?)?)),
        (Some("forall"), [params, body]) => Ok(Effect::forall(
            typed_list(list(params, "a parameter list")?, true)?,
            effect(body)?,
        )),
        (Some("when"), [condition, body]) => Ok(Effect::when(formula(condition)?, effect(body)?)),
        (Some("not" | "forall" | "when"), _) => Err(unexpected("a well-formed effect", expr)),
        _ => Ok(Effect::Add(parse_atom(items)?)),
    }
}

fn action(items: &[SExpr]) -> Result<ActionSchema, ParseError> {
    let (name, mut rest) = match items {
        [_, SExpr::Atom(name), rest @ ..] => (name.clone(), rest),
        _ => return Err(unexpected("an action name", &SExpr::List(items.to_vec()))),
    };

    let mut schema = ActionSchema {
        name,
        params: Vec::new(),
        precondition: Formula::And(Vec::new()),
        effect: Effect::And(Vec::new()),
    };
    while let [key, value, tail @ ..] = rest {
        match atom(key, "an action keyword")? {
            ":parameters" => schema.params = typed_list(list(value, "a parameter list")?, true)?,
            ":precondition" => schema.precondition = formula(value)?,
            ":effect" => schema.effect = effect(value)?,
            _ => return Err(unexpected("an action keyword", key)),
        }
        rest = tail;
    }
    if let [dangling] = rest {
        return Err(unexpected("a keyword value", dangling));
    }
    Ok(schema)
}

pub fn parse_domain(text: &str) -> Result<Domain, ParseError> {
    let expr = sexpr::read_one(text)?;
    let (name, sections) = definition(&expr, "domain")?;

    let mut domain = Domain {
        name: name.to_owned(),
        requirements: Vec::new(),
        types: Vec::new(),
        constants: Vec::new(),
        predicates: Vec::new(),
        actions: Vec::new(),
    };

    for section in sections {
        let items = list(section, "a domain section")?;
        match section.head() {
            Some(":requirements") => {
                for flag in &items[1..] {
                    let flag = atom(flag, "a requirement")?;
                    let requirement = flag
                        .strip_prefix(':')
                        .and_then(|name| Requirement::from_str(name).ok())
                        .ok_or_else(|| ParseError::UnknownRequirement(flag.to_owned()))?;
                    domain.requirements.push(requirement);
                }
            }
            Some(":types") => {
                domain.types = typed_list(&items[1..], false)?
                    .into_iter()
                    .map(|typed| typed.name)
                    .collect();
            }
            Some(":constants") => domain.constants = typed_list(&items[1..], false)?,
            Some(":predicates") => {
                for predicate in &items[1..] {
                    let parts = list(predicate, "a predicate declaration")?;
                    let (head, params) = parts
                        .split_first()
                        .ok_or_else(|| unexpected("a predicate declaration", predicate))?;
                    domain.predicates.push(PredicateDef {
                        name: atom(head, "a predicate name")?.to_owned(),
                        params: typed_list(params, true)?,
                    });
                }
            }
            Some(":action") => domain.actions.push(action(items)?),
            _ => return Err(unexpected("a domain section", section)),
        }
    }

    Ok(domain)
}

pub fn parse_problem(text: &str) -> Result<Problem, ParseError> {
    let expr = sexpr::read_one(text)?;
    let (name, sections) = definition(&expr, "problem")?;

    let mut problem = Problem {
        name: name.to_owned(),
        domain: String::new(),
        objects: Vec::new(),
        init: Vec::new(),
        goal: Formula::And(Vec::new()),
    };

    for section in sections {
        let items = list(section, "a problem section")?;
        match (section.head(), items.get(1..).unwrap_or_default()) {
            (Some(":domain"), [domain]) => problem.domain = atom(domain, "a domain name")?.to_owned(),
            (Some(":objects"), objects) => problem.objects = typed_list(objects, false)?,
            (Some(":init"), facts) => {
                for fact in facts {
                    let parts = list(fact, "an initial fact")?;
                    let parsed = parse_atom(parts)?;
                    let args = parsed
                        .args
                        .into_iter()
                        .map(|term| match term {
                            Term::Const(name) => Ok(name),
                            Term::Var(_) => Err(unexpected("a ground fact", fact)),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    problem.init.push(Fact::new(parsed.predicate, args));
                }
            }
            (Some(":goal"), [goal]) => problem.goal = formula(goal)?,
            _ => return Err(unexpected("a problem section", section)),
        }
    }

    Ok(problem)
}
