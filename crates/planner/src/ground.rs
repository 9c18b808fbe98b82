//! Grounded formal model of a parsed planning task.
//!
//! Every action schema is instantiated over the declared objects. Predicates
//! that no effect ever touches are static: they are evaluated once during
//! grounding and never appear in a state. The remaining atoms are interned
//! and a state is a bitset over them.

use std::collections::{HashMap, HashSet};

use crate::pddl::{
    self, ActionSchema, Atom, Domain, Effect, Fact, Formula, ParseError, Problem, Term, Typed,
};
use crate::plan::PlanStep;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GroundingError {
    #[error("problem targets domain '{problem}' but the domain is '{domain}'")]
    DomainMismatch { domain: String, problem: String },

    #[error("undeclared predicate '{0}'")]
    UnknownPredicate(String),

    #[error("predicate '{predicate}' takes {expected} arguments, found {found}")]
    Arity {
        predicate: String,
        expected: usize,
        found: usize,
    },

    #[error("undeclared object '{0}'")]
    UnknownObject(String),

    #[error("variable '?{0}' is not bound")]
    UnboundVariable(String),

    #[error("object '{name}' is declared as both {first} and {second}")]
    ConflictingType {
        name: String,
        first: String,
        second: String,
    },
}

/// Failure to turn planning text into a ground model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("domain: {0}")]
    Domain(ParseError),

    #[error("problem: {0}")]
    Problem(ParseError),

    #[error(transparent)]
    Grounding(#[from] GroundingError),
}

/// Set of true dynamic atoms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FactSet {
    words: Vec<u64>,
}

impl FactSet {
    fn with_atoms(atoms: usize) -> Self {
        Self {
            words: vec![0; atoms.div_ceil(64)],
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.words
            .get(atom / 64)
            .is_some_and(|word| (word >> (atom % 64)) & 1 == 1)
    }

    fn insert(&mut self, atom: usize) {
        if let Some(word) = self.words.get_mut(atom / 64) {
            *word |= 1 << (atom % 64);
        }
    }

    fn remove(&mut self, atom: usize) {
        if let Some(word) = self.words.get_mut(atom / 64) {
            *word &= !(1 << (atom % 64));
        }
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(index, word)| {
            (0..64)
                .filter(move |bit| (word >> bit) & 1 == 1)
                .map(move |bit| index * 64 + bit)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum GroundFormula {
    True,
    False,
    Atom(usize),
    Not(Box<GroundFormula>),
    And(Vec<GroundFormula>),
    Or(Vec<GroundFormula>),
}

impl GroundFormula {
    fn constant(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    fn and(parts: Vec<Self>) -> Self {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::True => {}
                Self::False => return Self::False,
                Self::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::True,
            1 => kept.remove(0),
            _ => Self::And(kept),
        }
    }

    fn or(parts: Vec<Self>) -> Self {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::False => {}
                Self::True => return Self::True,
                Self::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::False,
            1 => kept.remove(0),
            _ => Self::Or(kept),
        }
    }

    fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    fn holds(&self, state: &FactSet) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Atom(atom) => state.contains(*atom),
            Self::Not(inner) => !inner.holds(state),
            Self::And(parts) => parts.iter().all(|part| part.holds(state)),
            Self::Or(parts) => parts.iter().any(|part| part.holds(state)),
        }
    }
}

/// A single add or delete, guarded by a condition evaluated on the pre-state.
#[derive(Clone, Debug, PartialEq, Eq)]
struct GroundEffect {
    condition: GroundFormula,
    atom: usize,
    add: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroundAction {
    step: PlanStep,
    precondition: GroundFormula,
    effects: Vec<GroundEffect>,
}

impl GroundAction {
    pub fn step(&self) -> &PlanStep {
        &self.step
    }

    pub fn is_applicable(&self, state: &FactSet) -> bool {
        self.precondition.holds(state)
    }
}

/// Fully instantiated planning task.
#[derive(Clone, Debug)]
pub struct GroundTask {
    atoms: Vec<Fact>,
    actions: Vec<GroundAction>,
    lookup: HashMap<PlanStep, usize>,
    init: FactSet,
    goal: GroundFormula,
}

impl GroundTask {
    pub fn new(domain: &Domain, problem: &Problem) -> Result<Self, GroundingError> {
        if problem.domain != domain.name {
            return Err(GroundingError::DomainMismatch {
                domain: domain.name.clone(),
                problem: problem.domain.clone(),
            });
        }

        let mut grounder = Grounder::new(domain, problem)?;
        let mut actions = Vec::new();
        for schema in &domain.actions {
            grounder.ground_schema(schema, &mut actions)?;
        }
        let goal = grounder.formula(&problem.goal, &mut HashMap::new())?;

        let mut dynamic_init = Vec::new();
        for fact in &problem.init {
            if !grounder.is_static(&fact.predicate) {
                dynamic_init.push(grounder.intern(fact.clone()));
            }
        }
        let mut init = FactSet::with_atoms(grounder.atoms.len());
        for atom in dynamic_init {
            init.insert(atom);
        }

        let lookup = actions
            .iter()
            .enumerate()
            .map(|(index, action)| (action.step.clone(), index))
            .collect();

        tracing::debug!(
            actions = actions.len(),
            atoms = grounder.atoms.len(),
            "grounded planning task"
        );

        Ok(Self {
            atoms: grounder.atoms,
            actions,
            lookup,
            init,
            goal,
        })
    }

    /// Parses both texts and grounds them.
    pub fn from_text(domain: &str, problem: &str) -> Result<Self, TaskError> {
        let domain = pddl::parse_domain(domain).map_err(TaskError::Domain)?;
        let problem = pddl::parse_problem(problem).map_err(TaskError::Problem)?;
        Ok(Self::new(&domain, &problem)?)
    }

    pub fn init(&self) -> &FactSet {
        &self.init
    }

    pub fn actions(&self) -> &[GroundAction] {
        &self.actions
    }

    pub fn action(&self, index: usize) -> Option<&GroundAction> {
        self.actions.get(index)
    }

    /// Index of the ground action matching `step`, if it was instantiated.
    pub fn find(&self, step: &PlanStep) -> Option<usize> {
        self.lookup.get(step).copied()
    }

    pub fn applicable<'a>(&'a self, state: &'a FactSet) -> impl Iterator<Item = usize> + 'a {
        self.actions
            .iter()
            .enumerate()
            .filter(move |(_, action)| action.is_applicable(state))
            .map(|(index, _)| index)
    }

    /// Applies action `index` to `state`. Effect conditions are read from
    /// `state`; deletes land before adds.
    pub fn apply(&self, state: &FactSet, index: usize) -> FactSet {
        let mut next = state.clone();
        let Some(action) = self.actions.get(index) else {
            return next;
        };
        let fired: Vec<&GroundEffect> = action
            .effects
            .iter()
            .filter(|effect| effect.condition.holds(state))
            .collect();
        for effect in fired.iter().filter(|effect| !effect.add) {
            next.remove(effect.atom);
        }
        for effect in fired.iter().filter(|effect| effect.add) {
            next.insert(effect.atom);
        }
        next
    }

    pub fn is_goal(&self, state: &FactSet) -> bool {
        self.goal.holds(state)
    }

    /// Dynamic facts true in `state`.
    pub fn facts<'a>(&'a self, state: &'a FactSet) -> impl Iterator<Item = &'a Fact> + 'a {
        state.iter().filter_map(|atom| self.atoms.get(atom))
    }
}

type Binding<'a> = HashMap<&'a str, &'a str>;

struct Grounder<'a> {
    /// Object names by declared type, plus `object` for everything.
    by_type: HashMap<&'a str, Vec<&'a str>>,
    objects: HashSet<&'a str>,
    arity: HashMap<&'a str, usize>,
    dynamic: HashSet<&'a str>,
    static_facts: HashSet<(&'a str, Vec<&'a str>)>,
    atoms: Vec<Fact>,
    index: HashMap<Fact, usize>,
}

fn effect_predicates<'a>(effect: &'a Effect, out: &mut HashSet<&'a str>) {
    match effect {
        Effect::Add(atom) | Effect::Del(atom) => {
            out.insert(atom.predicate.as_str());
        }
        Effect::And(parts) => parts.iter().for_each(|part| effect_predicates(part, out)),
        Effect::Forall(_, body) | Effect::When(_, body) => effect_predicates(body, out),
    }
}

impl<'a> Grounder<'a> {
    fn new(domain: &'a Domain, problem: &'a Problem) -> Result<Self, GroundingError> {
        let mut declared: HashMap<&str, &str> = HashMap::new();
        let mut by_type: HashMap<&str, Vec<&str>> = HashMap::new();
        for typed in domain.constants.iter().chain(&problem.objects) {
            match declared.insert(typed.name.as_str(), typed.ty.as_str()) {
                Some(first) if first != typed.ty => {
                    return Err(GroundingError::ConflictingType {
                        name: typed.name.clone(),
                        first: first.to_owned(),
                        second: typed.ty.clone(),
                    });
                }
                Some(_) => continue,
                None => {}
            }
            by_type.entry(typed.ty.as_str()).or_default().push(typed.name.as_str());
            if typed.ty != "object" {
                by_type.entry("object").or_default().push(typed.name.as_str());
            }
        }

        let arity = domain
            .predicates
            .iter()
            .map(|predicate| (predicate.name.as_str(), predicate.params.len()))
            .collect();

        let mut dynamic = HashSet::new();
        for action in &domain.actions {
            effect_predicates(&action.effect, &mut dynamic);
        }

        let mut grounder = Self {
            by_type,
            objects: declared.keys().copied().collect(),
            arity,
            dynamic,
            static_facts: HashSet::new(),
            atoms: Vec::new(),
            index: HashMap::new(),
        };

        for fact in &problem.init {
            grounder.check_signature(&fact.predicate, fact.args.len())?;
            if let Some(unknown) = fact.args.iter().find(|arg| !grounder.objects.contains(arg.as_str())) {
                return Err(GroundingError::UnknownObject(unknown.clone()));
            }
            if grounder.is_static(&fact.predicate) {
                grounder.static_facts.insert((
                    fact.predicate.as_str(),
                    fact.args.iter().map(String::as_str).collect(),
                ));
            }
        }
        Ok(grounder)
    }

    fn is_static(&self, predicate: &str) -> bool {
        !self.dynamic.contains(predicate)
    }

    fn check_signature(&self, predicate: &str, found: usize) -> Result<(), GroundingError> {
        match self.arity.get(predicate) {
            None => Err(GroundingError::UnknownPredicate(predicate.to_owned())),
            Some(&expected) if expected != found => Err(GroundingError::Arity {
                predicate: predicate.to_owned(),
                expected,
                found,
            }),
            Some(_) => Ok(()),
        }
    }

    fn intern(&mut self, fact: Fact) -> usize {
        if let Some(&index) = self.index.get(&fact) {
            return index;
        }
        let index = self.atoms.len();
        self.atoms.push(fact.clone());
        self.index.insert(fact, index);
        index
    }

    fn objects_of(&self, ty: &str) -> Vec<&'a str> {
        self.by_type.get(ty).cloned().unwrap_or_default()
    }

    fn resolve(&self, term: &'a Term, binding: &Binding<'a>) -> Result<&'a str, GroundingError> {
        match term {
            Term::Var(name) => binding
                .get(name.as_str())
                .copied()
                .ok_or_else(|| GroundingError::UnboundVariable(name.clone())),
            Term::Const(name) if self.objects.contains(name.as_str()) => Ok(name.as_str()),
            Term::Const(name) => Err(GroundingError::UnknownObject(name.clone())),
        }
    }

    fn resolve_args(
        &self,
        atom: &'a Atom,
        binding: &Binding<'a>,
    ) -> Result<Vec<&'a str>, GroundingError> {
        self.check_signature(&atom.predicate, atom.args.len())?;
        atom.args.iter().map(|term| self.resolve(term, binding)).collect()
    }

    /// Truth of a static atom under `binding`.
    fn static_truth(&self, atom: &'a Atom, binding: &Binding<'a>) -> Result<bool, GroundingError> {
        let args = self.resolve_args(atom, binding)?;
        Ok(self.static_facts.contains(&(atom.predicate.as_str(), args)))
    }

    fn atom(&mut self, atom: &'a Atom, binding: &Binding<'a>) -> Result<GroundFormula, GroundingError> {
        if self.is_static(&atom.predicate) {
            return Ok(GroundFormula::constant(self.static_truth(atom, binding)?));
        }
        let args = self.resolve_args(atom, binding)?;
        Ok(GroundFormula::Atom(self.intern(Fact::new(atom.predicate.as_str(), args))))
    }

    /// All assignments of objects to `params`, in declaration order.
    fn assignments(&self, params: &[Typed]) -> Vec<Vec<&'a str>> {
        let mut result = vec![Vec::new()];
        for param in params {
            let candidates = self.objects_of(&param.ty);
            result = result
                .into_iter()
                .flat_map(|prefix| {
                    candidates.iter().map(move |object| {
                        let mut next = prefix.clone();
                        next.push(*object);
                        next
                    })
                })
                .collect();
        }
        result
    }

    fn formula(
        &mut self,
        formula: &'a Formula,
        binding: &mut Binding<'a>,
    ) -> Result<GroundFormula, GroundingError> {
        Ok(match formula {
            Formula::Atom(atom) => self.atom(atom, binding)?,
            Formula::Not(inner) => self.formula(inner, binding)?.negate(),
            Formula::And(parts) => GroundFormula::and(
                parts
                    .iter()
                    .map(|part| self.formula(part, binding))
                    .collect::<Result<_, _>>()?,
            ),
            Formula::Or(parts) => GroundFormula::or(
                parts
                    .iter()
                    .map(|part| self.formula(part, binding))
                    .collect::<Result<_, _>>()?,
            ),
            Formula::Imply(premise, conclusion) => GroundFormula::or(vec![
                self.formula(premise, binding)?.negate(),
                self.formula(conclusion, binding)?,
            ]),
            Formula::Forall(params, body) => {
                let mut parts = Vec::new();
                for assignment in self.assignments(params) {
                    let saved = bind(binding, params, &assignment);
                    let part = self.formula(body, binding);
                    restore(binding, saved);
                    parts.push(part?);
                }
                GroundFormula::and(parts)
            }
        })
    }

    fn effect(
        &mut self,
        effect: &'a Effect,
        binding: &mut Binding<'a>,
        condition: &GroundFormula,
        out: &mut Vec<GroundEffect>,
    ) -> Result<(), GroundingError> {
        match effect {
            Effect::Add(atom) | Effect::Del(atom) => {
                let args = self.resolve_args(atom, binding)?;
                let atom = self.intern(Fact::new(atom.predicate.as_str(), args));
                out.push(GroundEffect {
                    condition: condition.clone(),
                    atom,
                    add: matches!(effect, Effect::Add(_)),
                });
            }
            Effect::And(parts) => {
                for part in parts {
                    self.effect(part, binding, condition, out)?;
                }
            }
            Effect::Forall(params, body) => {
                for assignment in self.assignments(params) {
                    let saved = bind(binding, params, &assignment);
                    let result = self.effect(body, binding, condition, out);
                    restore(binding, saved);
                    result?;
                }
            }
            Effect::When(guard, body) => {
                let guard = self.formula(guard, binding)?;
                let combined = GroundFormula::and(vec![condition.clone(), guard]);
                if combined != GroundFormula::False {
                    self.effect(body, binding, &combined, out)?;
                }
            }
        }
        Ok(())
    }

    fn ground_schema(
        &mut self,
        schema: &'a ActionSchema,
        out: &mut Vec<GroundAction>,
    ) -> Result<(), GroundingError> {
        // Static top-level literals, checked as soon as their last parameter is bound.
        let position: HashMap<&str, usize> = schema
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| (param.name.as_str(), index))
            .collect();
        let mut checks: Vec<Vec<(&'a Atom, bool)>> = vec![Vec::new(); schema.params.len()];
        for conjunct in schema.precondition.conjuncts() {
            let (atom, positive) = match conjunct {
                Formula::Atom(atom) => (atom, true),
                Formula::Not(inner) => match inner.as_ref() {
                    Formula::Atom(atom) => (atom, false),
                    _ => continue,
                },
                _ => continue,
            };
            if !self.is_static(&atom.predicate) {
                continue;
            }
            let depth = atom.args.iter().try_fold(0, |depth, term| match term {
                Term::Var(name) => position.get(name.as_str()).map(|p| depth.max(*p)),
                Term::Const(_) => Some(depth),
            });
            if let Some(bucket) = depth.and_then(|depth| checks.get_mut(depth)) {
                bucket.push((atom, positive));
            }
        }

        let candidates: Vec<Vec<&'a str>> = schema
            .params
            .iter()
            .map(|param| self.objects_of(&param.ty))
            .collect();
        let mut binding = Binding::new();
        self.bind_params(schema, &candidates, &checks, 0, &mut binding, out)
    }

    fn bind_params(
        &mut self,
        schema: &'a ActionSchema,
        candidates: &[Vec<&'a str>],
        checks: &[Vec<(&'a Atom, bool)>],
        depth: usize,
        binding: &mut Binding<'a>,
        out: &mut Vec<GroundAction>,
    ) -> Result<(), GroundingError> {
        let Some(param) = schema.params.get(depth) else {
            return self.instantiate(schema, binding, out);
        };

        for &object in &candidates[depth] {
            binding.insert(param.name.as_str(), object);
            let mut pruned = false;
            for &(atom, positive) in &checks[depth] {
                if self.static_truth(atom, binding)? != positive {
                    pruned = true;
                    break;
                }
            }
            if !pruned {
                self.bind_params(schema, candidates, checks, depth + 1, binding, out)?;
            }
        }
        binding.remove(param.name.as_str());
        Ok(())
    }

    fn instantiate(
        &mut self,
        schema: &'a ActionSchema,
        binding: &mut Binding<'a>,
        out: &mut Vec<GroundAction>,
    ) -> Result<(), GroundingError> {
        let precondition = self.formula(&schema.precondition, binding)?;
        if precondition == GroundFormula::False {
            return Ok(());
        }
        let mut effects = Vec::new();
        self.effect(&schema.effect, binding, &GroundFormula::True, &mut effects)?;

        let args = schema
            .params
            .iter()
            .map(|param| binding.get(param.name.as_str()).copied().unwrap_or_default())
            .collect::<Vec<_>>();
        out.push(GroundAction {
            step: PlanStep::new(schema.name.as_str(), args),
            precondition,
            effects,
        });
        Ok(())
    }
}

/// Binds `params` to `values`, returning the shadowed bindings.
fn bind<'a>(
    binding: &mut Binding<'a>,
    params: &'a [Typed],
    values: &[&'a str],
) -> Vec<(&'a str, Option<&'a str>)> {
    params
        .iter()
        .zip(values)
        .map(|(param, value)| {
            let name = param.name.as_str();
            (name, binding.insert(name, value))
        })
        .collect()
}

fn restore<'a>(binding: &mut Binding<'a>, saved: Vec<(&'a str, Option<&'a str>)>) {
    for (name, previous) in saved.into_iter().rev() {
        match previous {
            Some(value) => binding.insert(name, value),
            None => binding.remove(name),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "
        (define (domain switches)
          (:requirements :strips :typing :negative-preconditions :conditional-effects)
          (:types switch lamp)
          (:predicates (wired ?s - switch ?l - lamp) (on ?s - switch) (lit ?l - lamp))
          (:action flip-on
            :parameters (?s - switch)
            :precondition (not (on ?s))
            :effect (and (on ?s)
                         (forall (?l - lamp) (when (wired ?s ?l) (lit ?l))))))";

    const PROBLEM: &str = "
        (define (problem two)
          (:domain switches)
          (:objects a b - switch hall porch - lamp)
          (:init (wired a hall) (wired b porch) (on b))
          (:goal (and (lit hall) (lit porch))))";

    #[test]
    fn static_predicates_stay_out_of_states() {
        let task = GroundTask::from_text(DOMAIN, PROBLEM).unwrap();
        let facts: Vec<_> = task.facts(task.init()).map(ToString::to_string).collect();
        assert_eq!(facts, ["(on b)"]);
        assert_eq!(task.actions().len(), 2);
    }

    #[test]
    fn conditional_effects_follow_static_wiring() {
        let task = GroundTask::from_text(DOMAIN, PROBLEM).unwrap();
        let applicable: Vec<_> = task.applicable(task.init()).collect();
        assert_eq!(applicable.len(), 1);

        let flip_a = task.find(&PlanStep::new("flip-on", ["a"])).unwrap();
        let next = task.apply(task.init(), flip_a);
        let facts: Vec<_> = task.facts(&next).map(ToString::to_string).collect();
        assert!(facts.contains(&"(lit hall)".to_owned()));
        assert!(!facts.contains(&"(lit porch)".to_owned()));
        assert!(!task.is_goal(&next));
    }

    #[test]
    fn undeclared_objects_are_rejected() {
        let problem = PROBLEM.replace("(on b)", "(on c)");
        assert_eq!(
            GroundTask::from_text(DOMAIN, &problem).unwrap_err(),
            TaskError::Grounding(GroundingError::UnknownObject("c".into()))
        );
    }

    #[test]
    fn domain_names_must_match() {
        let problem = PROBLEM.replace("(:domain switches)", "(:domain other)");
        assert!(matches!(
            GroundTask::from_text(DOMAIN, &problem),
            Err(TaskError::Grounding(GroundingError::DomainMismatch { .. }))
        ));
    }

    #[test]
    fn fact_sets_track_membership() {
        let mut set = FactSet::with_atoms(130);
        set.insert(3);
        set.insert(129);
        assert!(set.contains(129) && !set.contains(4));
        set.remove(3);
        assert_eq!(set.iter().collect::<Vec<_>>(), [129]);
        assert_eq!(set.len(), 1);
    }
}
