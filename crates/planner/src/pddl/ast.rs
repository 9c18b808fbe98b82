//! Typed representation of the PDDL subset used by the narrative domain.
//!
//! Variables are stored without their leading `?`; the renderer adds it back.

/// PDDL `:requirements` flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Requirement {
    Strips,
    Typing,
    NegativePreconditions,
    DisjunctivePreconditions,
    UniversalPreconditions,
    ConditionalEffects,
}

/// A name with its declared type, used for parameters, constants and objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Typed {
    pub name: String,
    pub ty: String,
}

impl Typed {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(String),
    Const(String),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::Const(name.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: String,
    pub args: Vec<Term>,
}

impl Atom {
    pub fn new(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self {
            predicate: predicate.into(),
            args: args.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    Atom(Atom),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Imply(Box<Formula>, Box<Formula>),
    Forall(Vec<Typed>, Box<Formula>),
}

impl Formula {
    pub fn atom(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self::Atom(Atom::new(predicate, args))
    }

    pub fn not(inner: Formula) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn imply(premise: Formula, conclusion: Formula) -> Self {
        Self::Imply(Box::new(premise), Box::new(conclusion))
    }

    pub fn forall(params: Vec<Typed>, body: Formula) -> Self {
        Self::Forall(params, Box::new(body))
    }

    /// Top-level conjuncts; a non-conjunction is its own single conjunct.
    pub fn conjuncts(&self) -> &[Formula] {
        match self {
            Self::And(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    Add(Atom),
    Del(Atom),
    And(Vec<Effect>),
    Forall(Vec<Typed>, Box<Effect>),
    When(Formula, Box<Effect>),
}

impl Effect {
    pub fn add(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self::Add(Atom::new(predicate, args))
    }

    pub fn del(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self::Del(Atom::new(predicate, args))
    }

    pub fn when(condition: Formula, effect: Effect) -> Self {
        Self::When(condition, Box::new(effect))
    }

    pub fn forall(params: Vec<Typed>, body: Effect) -> Self {
        Self::Forall(params, Box::new(body))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PredicateDef {
    pub name: String,
    pub params: Vec<Typed>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActionSchema {
    pub name: String,
    pub params: Vec<Typed>,
    pub precondition: Formula,
    pub effect: Effect,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Domain {
    pub name: String,
    pub requirements: Vec<Requirement>,
    pub types: Vec<String>,
    pub constants: Vec<Typed>,
    pub predicates: Vec<PredicateDef>,
    pub actions: Vec<ActionSchema>,
}

impl Domain {
    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn predicate(&self, name: &str) -> Option<&PredicateDef> {
        self.predicates.iter().find(|predicate| predicate.name == name)
    }
}

/// Fully instantiated fact, as found in `:init`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fact {
    pub predicate: String,
    pub args: Vec<String>,
}

impl Fact {
    pub fn new<I, S>(predicate: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            predicate: predicate.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Problem {
    pub name: String,
    pub domain: String,
    pub objects: Vec<Typed>,
    pub init: Vec<Fact>,
    pub goal: Formula,
}
