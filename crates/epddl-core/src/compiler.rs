// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The compilation context.
//!
//! One [`Compiler`] value carries every table a domain/problem pair
//! produces: requirements, the type hierarchy, the object registry,
//! predicate signatures, action templates and the problem's initial state
//! and goals. Registries accumulate across the two parse calls, so a
//! context serves exactly one pair; reusing it for a second problem would
//! cross-contaminate the registries.

use crate::action::ActionTemplate;
use crate::error::Error;
use crate::fluent::Literal;
use crate::hierarchy::NameTable;

/// A `:requirements` flag the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Basic add/delete action semantics.
    Strips,
    /// Negated precondition literals.
    NegativePreconditions,
    /// Typed parameters and objects.
    Typing,
    /// Exclude assignments binding one object to two parameters.
    NoDuplicates,
    /// Multi-agent epistemic planning constructs.
    Mep,
}

impl Requirement {
    /// Parses one `:requirements` flag.
    pub(crate) fn parse(word: &str) -> Result<Self, Error> {
        match word {
            ":strips" => Ok(Self::Strips),
            ":negative-preconditions" => Ok(Self::NegativePreconditions),
            ":typing" => Ok(Self::Typing),
            ":no-duplicates" => Ok(Self::NoDuplicates),
            ":mep" => Ok(Self::Mep),
            other => Err(Error::UnsupportedRequirement {
                requirement: other.to_owned(),
            }),
        }
    }

    /// The flag's source spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strips => ":strips",
            Self::NegativePreconditions => ":negative-preconditions",
            Self::Typing => ":typing",
            Self::NoDuplicates => ":no-duplicates",
            Self::Mep => ":mep",
        }
    }
}

/// A predicate signature from `:predicates`.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// Predicate name.
    pub name: String,
    /// Ordered `(variable, type)` pairs. A variable repeated in one
    /// declaration collapses to a single slot, the last type winning.
    pub parameters: Vec<(String, String)>,
}

/// All state for one domain/problem compilation.
#[derive(Debug, Default)]
pub struct Compiler {
    pub(crate) domain_name: String,
    pub(crate) problem_name: String,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) types: NameTable,
    pub(crate) objects: NameTable,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) actions: Vec<ActionTemplate>,
    pub(crate) state: Vec<Literal>,
    pub(crate) positive_goals: Vec<Literal>,
    pub(crate) negative_goals: Vec<Literal>,
}

impl Compiler {
    /// Fresh, empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The name recorded from the domain file's `domain` clause.
    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// The name recorded from the problem file's `problem` clause.
    #[must_use]
    pub fn problem_name(&self) -> &str {
        &self.problem_name
    }

    /// Declared requirements, in declaration order.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Whether `:no-duplicates` is active for grounding.
    #[must_use]
    pub fn no_duplicates(&self) -> bool {
        self.requirements.contains(&Requirement::NoDuplicates)
    }

    /// The supertype hierarchy from `:types`.
    #[must_use]
    pub fn types(&self) -> &NameTable {
        &self.types
    }

    /// The object registry: domain `:constants`, problem `:objects` and
    /// `:agents` combined.
    #[must_use]
    pub fn objects(&self) -> &NameTable {
        &self.objects
    }

    /// Predicate signatures, in declaration order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Action templates, in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[ActionTemplate] {
        &self.actions
    }

    /// Initial-state literals from `:init`, in declaration order.
    #[must_use]
    pub fn initial_state(&self) -> &[Literal] {
        &self.state
    }

    /// Positive goal literals from `:goal`.
    #[must_use]
    pub fn positive_goals(&self) -> &[Literal] {
        &self.positive_goals
    }

    /// Negative goal literals from `:goal`.
    #[must_use]
    pub fn negative_goals(&self) -> &[Literal] {
        &self.negative_goals
    }

    pub(crate) fn predicate_known(&self, name: &str) -> bool {
        self.predicates.iter().any(|p| p.name == name)
    }

    pub(crate) fn action_known(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }
}
