// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain-file parsing.
//!
//! A domain file is one `(define …)` expression whose clauses are
//! dispatched by their leading keyword. Clause order is free. Unrecognized
//! clauses are logged and skipped so dialect extensions do not abort a
//! compile; unrecognized *action* fields are kept verbatim on the template
//! for the same reason.

use tracing::warn;

use crate::action::{ActType, ActionTemplate};
use crate::compiler::{Compiler, Predicate, Requirement};
use crate::error::Error;
use crate::hierarchy::{parse_grouped_names, parse_typed_pairs};
use crate::logic::{compile_expression, split_expression, ClauseContext};
use crate::token::{scan, Node};

impl Compiler {
    /// Parses domain source text into the compilation context.
    ///
    /// Registers requirements, the type hierarchy, constants, predicate
    /// signatures and action templates. A later `:requirements` clause
    /// replaces an earlier one wholesale.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] when the file is not a `(define …)` expression or
    /// a clause is structurally broken; [`Error::UnsupportedRequirement`],
    /// [`Error::Redefinition`], [`Error::ActionType`] and
    /// [`Error::MalformedClause`] as the respective clauses are parsed.
    pub fn parse_domain(&mut self, source: &str) -> Result<(), Error> {
        let root = scan(source)?;
        let items = root
            .as_list()
            .filter(|items| items.first().and_then(Node::as_atom) == Some("define"))
            .ok_or_else(|| Error::syntax("file does not match the domain pattern"))?;
        self.domain_name = "unknown".to_owned();
        for clause in &items[1..] {
            let Some(clause_items) = clause.as_list() else {
                return Err(Error::syntax("expected a parenthesized domain clause"));
            };
            let Some(keyword) = clause_items.first().and_then(Node::as_atom) else {
                return Err(Error::syntax("domain clause without a leading keyword"));
            };
            let body = &clause_items[1..];
            match keyword {
                "domain" => {
                    self.domain_name = body
                        .first()
                        .and_then(Node::as_atom)
                        .ok_or_else(|| Error::syntax("the domain clause has no name"))?
                        .to_owned();
                }
                ":requirements" => {
                    let mut requirements = Vec::with_capacity(body.len());
                    for item in body {
                        let word = item.as_atom().ok_or_else(|| {
                            Error::syntax("expected a requirement flag in :requirements")
                        })?;
                        requirements.push(Requirement::parse(word)?);
                    }
                    self.requirements = requirements;
                }
                ":types" => parse_grouped_names(body, &mut self.types, ":types", true)?,
                ":constants" => parse_grouped_names(body, &mut self.objects, ":constants", false)?,
                ":predicates" => self.parse_predicates(body)?,
                ":action" => self.parse_action(body)?,
                other => warn!("`{}` is not recognized in the domain", other),
            }
        }
        Ok(())
    }

    /// Registers `:predicates` declarations. A variable repeated within one
    /// declaration collapses to a single slot at its first position, the
    /// last declared type winning.
    fn parse_predicates(&mut self, items: &[Node]) -> Result<(), Error> {
        for declaration in items {
            let Some(tokens) = declaration.as_list() else {
                return Err(Error::syntax("expected a parenthesized predicate declaration"));
            };
            let Some(name) = tokens.first().and_then(Node::as_atom) else {
                return Err(Error::syntax("predicate declaration without a name"));
            };
            if self.predicate_known(name) {
                return Err(Error::Redefinition {
                    entity: "predicate",
                    name: name.to_owned(),
                });
            }
            let pairs = parse_typed_pairs(&tokens[1..], &format!("the `{name}` declaration"))?;
            let mut parameters: Vec<(String, String)> = Vec::new();
            for (var, ty) in pairs {
                if let Some(slot) = parameters.iter_mut().find(|(v, _)| *v == var) {
                    slot.1 = ty;
                } else {
                    parameters.push((var, ty));
                }
            }
            self.predicates.push(Predicate {
                name: name.to_owned(),
                parameters,
            });
        }
        Ok(())
    }

    /// Parses one `:action` clause into a template. Field order is free;
    /// a known keyword missing its value is an error, while an unknown
    /// keyword and its value are retained as an extension.
    fn parse_action(&mut self, items: &[Node]) -> Result<(), Error> {
        let Some(name) = items.first().and_then(Node::as_atom) else {
            return Err(Error::syntax("action without a name"));
        };
        let name = name.to_owned();
        if self.action_known(&name) {
            return Err(Error::Redefinition {
                entity: "action",
                name,
            });
        }
        let mut action = ActionTemplate {
            name: name.clone(),
            ..ActionTemplate::default()
        };
        let mut iter = items[1..].iter();
        while let Some(field) = iter.next() {
            let Some(keyword) = field.as_atom() else {
                warn!("skipping an unlabeled clause in action `{}`", name);
                continue;
            };
            match keyword {
                ":parameters" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    let Some(list) = value.as_list() else {
                        return Err(Error::syntax(format!(
                            "`{name}` parameters must be a parenthesized list"
                        )));
                    };
                    action.parameters = parse_typed_pairs(list, &format!("`{name}` parameters"))?;
                }
                ":act_type" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    let word = value.as_atom().ok_or_else(|| {
                        Error::syntax(format!("`:act_type` in action `{name}` must be a word"))
                    })?;
                    action.act_type = ActType::parse(&name, word)?;
                }
                ":precondition" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    split_expression(
                        value,
                        &format!("`{name}` preconditions"),
                        &mut action.positive_preconditions,
                        &mut action.negative_preconditions,
                    )?;
                }
                ":effect" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    compile_expression(
                        value,
                        ClauseContext::Effect,
                        &format!("`{name}` effects"),
                        &mut action.add_effects,
                        &mut action.del_effects,
                    )?;
                }
                ":observers" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    // Observer lists name witnesses; a bare `not` entry has
                    // no meaning there and is dropped.
                    let mut discarded = Vec::new();
                    compile_expression(
                        value,
                        ClauseContext::Observer,
                        &format!("`{name}` observers"),
                        &mut action.observers,
                        &mut discarded,
                    )?;
                }
                ":p_observers" => {
                    let value = next_value(&mut iter, &name, keyword)?;
                    let mut discarded = Vec::new();
                    compile_expression(
                        value,
                        ClauseContext::Observer,
                        &format!("`{name}` partial observers"),
                        &mut action.p_observers,
                        &mut discarded,
                    )?;
                }
                other => {
                    warn!("`{}` is not recognized in action `{}`", other, name);
                    action.extensions.push((other.to_owned(), iter.next().cloned()));
                }
            }
        }
        self.actions.push(action);
        Ok(())
    }
}

fn next_value<'a>(
    iter: &mut std::slice::Iter<'a, Node>,
    action: &str,
    keyword: &str,
) -> Result<&'a Node, Error> {
    iter.next()
        .ok_or_else(|| Error::syntax(format!("`{keyword}` in action `{action}` has no value")))
}
