// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compiler error taxonomy.
//!
//! Every failure the pipeline can produce is one variant of [`Error`]. All of
//! them are fatal: the compiler stops at the first one and the CLI maps them
//! onto its exit codes. The only non-fatal condition in the whole pipeline —
//! an unrecognized top-level keyword — never reaches this module; it is
//! logged and skipped at the parse site.

use std::fmt;
use thiserror::Error;

/// Why a type name failed to resolve to an object list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeResolutionReason {
    /// The name is neither an object-registry key nor a hierarchy key.
    Unknown,
    /// Resolution tried to expand the same hierarchy key twice, which means
    /// the declared hierarchy contains a cycle.
    Cyclic,
}

impl fmt::Display for TypeResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unrecognized type name"),
            Self::Cyclic => f.write_str("cyclic type hierarchy"),
        }
    }
}

/// Errors produced while compiling an E-PDDL domain/problem pair.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text failed tokenization or does not follow the expected
    /// list structure (unbalanced parentheses, bracket misuse, a file that
    /// does not match the `(define …)` pattern, and similar).
    #[error("syntax error: {detail}")]
    Syntax {
        /// Description of the malformed construct.
        detail: String,
    },

    /// A name was declared twice where the language requires uniqueness.
    #[error("{entity} `{name}` redefined")]
    Redefinition {
        /// Which table rejected the name (`predicate`, `action`, `supertype`).
        entity: &'static str,
        /// The offending name.
        name: String,
    },

    /// A `:requirements` flag outside the supported set.
    #[error("requirement `{requirement}` is not supported")]
    UnsupportedRequirement {
        /// The flag as written in the domain file.
        requirement: String,
    },

    /// A parameter or predicate type could not be resolved to objects.
    #[error("cannot resolve type `{name}`: {reason}")]
    TypeResolution {
        /// The type name that failed.
        name: String,
        /// Whether the name was unknown or part of a cycle.
        reason: TypeResolutionReason,
    },

    /// An action declared an `:act_type` outside ontic/announcement/sensing.
    #[error("action `{action}` declares unknown act_type `{found}`")]
    ActionType {
        /// The action being parsed.
        action: String,
        /// The rejected type token.
        found: String,
    },

    /// The problem file names a domain other than the one that was parsed.
    #[error("problem file targets domain `{referenced}` but domain `{parsed}` was loaded")]
    DomainMismatch {
        /// The `:domain` value in the problem file.
        referenced: String,
        /// The name recorded while parsing the domain file.
        parsed: String,
    },

    /// A logical combinator was used with the wrong shape or in the wrong
    /// position (`when` arity, `forall` outside observers, scoped negation
    /// with no operand, and similar).
    #[error("malformed clause: {detail}")]
    MalformedClause {
        /// Description of the misuse.
        detail: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Syntax`] with an owned message.
    pub(crate) fn syntax(detail: impl Into<String>) -> Self {
        Self::Syntax {
            detail: detail.into(),
        }
    }

    /// Shorthand for a [`Error::MalformedClause`] with an owned message.
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedClause {
            detail: detail.into(),
        }
    }
}
