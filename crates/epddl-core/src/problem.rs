// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Problem-file parsing.
//!
//! The problem file supplies the object registry, the agent set, the
//! initial state and the goals for a previously parsed domain. `:init` and
//! `:goal` replace any earlier content wholesale; the registry clauses
//! accumulate on top of the domain's `:constants`.

use tracing::warn;

use crate::compiler::Compiler;
use crate::error::Error;
use crate::hierarchy::{parse_agent_names, parse_grouped_names};
use crate::logic::split_body;
use crate::token::{scan, Node};

impl Compiler {
    /// Parses problem source text into the compilation context.
    ///
    /// Call after [`Compiler::parse_domain`]; the problem's `:domain`
    /// clause must name the parsed domain. A `:requirements` clause in the
    /// problem file is ignored, requirements bind in the domain. Negated
    /// `:init` entries are dropped, everything not initially true is false
    /// under the closed-world reading.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] when the file is not a `(define …)` expression or
    /// a clause is structurally broken; [`Error::DomainMismatch`] when the
    /// `:domain` clause names a different domain; literal errors pass
    /// through from the `:init` and `:goal` bodies.
    pub fn parse_problem(&mut self, source: &str) -> Result<(), Error> {
        let root = scan(source)?;
        let items = root
            .as_list()
            .filter(|items| items.first().and_then(Node::as_atom) == Some("define"))
            .ok_or_else(|| Error::syntax("file does not match the problem pattern"))?;
        self.problem_name = "unknown".to_owned();
        for clause in &items[1..] {
            let Some(clause_items) = clause.as_list() else {
                return Err(Error::syntax("expected a parenthesized problem clause"));
            };
            let Some(keyword) = clause_items.first().and_then(Node::as_atom) else {
                return Err(Error::syntax("problem clause without a leading keyword"));
            };
            let body = &clause_items[1..];
            match keyword {
                "problem" => {
                    self.problem_name = body
                        .first()
                        .and_then(Node::as_atom)
                        .ok_or_else(|| Error::syntax("the problem clause has no name"))?
                        .to_owned();
                }
                ":domain" => {
                    let referenced = body
                        .first()
                        .and_then(Node::as_atom)
                        .ok_or_else(|| Error::syntax("the :domain clause has no name"))?;
                    if referenced != self.domain_name {
                        return Err(Error::DomainMismatch {
                            referenced: referenced.to_owned(),
                            parsed: self.domain_name.clone(),
                        });
                    }
                }
                ":requirements" => {}
                ":objects" => parse_grouped_names(body, &mut self.objects, ":objects", false)?,
                ":agents" => parse_agent_names(body, &mut self.objects, ":agents")?,
                ":init" => {
                    let mut state = Vec::new();
                    let mut dropped = Vec::new();
                    split_body(body, ":init", &mut state, &mut dropped)?;
                    self.state = state;
                }
                ":goal" => {
                    let mut positive = Vec::new();
                    let mut negative = Vec::new();
                    split_body(body, ":goal", &mut positive, &mut negative)?;
                    self.positive_goals = positive;
                    self.negative_goals = negative;
                }
                other => warn!("`{}` is not recognized in the problem", other),
            }
        }
        Ok(())
    }
}
