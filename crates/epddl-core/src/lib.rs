// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! epddl-core: E-PDDL to mAp compiler.
//!
//! Takes an epistemic planning domain/problem pair in E-PDDL surface syntax
//! and produces the grounded textual "mAp" artifact used by epistemic
//! forward planners. The pipeline is scan → parse domain → parse problem →
//! ground → render; all of it is pure string-to-string and every fallible
//! step returns [`Error`].
//!
//! ```
//! use epddl_core::Compiler;
//!
//! let mut compiler = Compiler::new();
//! compiler.parse_domain("(define (domain doors) (:predicates (opened)))")?;
//! compiler.parse_problem("(define (problem one) (:domain doors) (:goal (opened)))")?;
//! let artifact = compiler.render()?;
//! assert!(artifact.contains("goal opened;"));
//! assert_eq!(compiler.artifact_name(), "doors_one.txt");
//! # Ok::<(), epddl_core::Error>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::use_self
)]

mod action;
mod compiler;
mod domain;
mod emit;
mod error;
mod fluent;
mod hierarchy;
mod logic;
mod problem;
mod token;

/// Action templates, grounding and the statement-class verbs.
pub use action::{ActType, ActionTemplate, GroundAction};
/// The compilation context and its declaration tables.
pub use compiler::{Compiler, Predicate, Requirement};
/// Everything that can go wrong while compiling.
pub use error::{Error, TypeResolutionReason};
/// Literal terms, epistemic scopes and canonical fluent text.
pub use fluent::{EpistemicKind, EpistemicOp, Literal, Term};
/// Type hierarchy tables and resolution.
pub use hierarchy::{resolve_type, NameTable, AGENT_TYPE, DEFAULT_TYPE};
/// Guarded effect and observer entries.
pub use logic::{Guard, GuardedLiteral};
/// Token trees and the source normalizer.
pub use token::{normalize, scan, Node};
