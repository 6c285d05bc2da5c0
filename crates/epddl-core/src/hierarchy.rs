// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Name tables and type resolution.
//!
//! Both the supertype hierarchy (`:types`) and the object registry
//! (`:constants`, `:objects`, `:agents`) are insertion-ordered tables from
//! a group name to member names. Resolution walks the hierarchy from a
//! requested type down to concrete objects, with cycle detection.

use std::collections::{HashSet, VecDeque};

use crate::error::{Error, TypeResolutionReason};
use crate::token::Node;

/// Reserved registry group holding the problem's declared agents.
pub const AGENT_TYPE: &str = "agent";

/// Fallback group for names declared without a `- type` annotation.
pub const DEFAULT_TYPE: &str = "object";

/// Insertion-ordered mapping from a group name to its member names.
///
/// A hierarchy, not a tree: the same member may be listed under several
/// groups, and lookups preserve declaration order throughout.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: Vec<(String, Vec<String>)>,
}

impl NameTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Members of `group`, in declaration order.
    #[must_use]
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, members)| members.as_slice())
    }

    /// Whether `group` exists as a key.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == group)
    }

    /// Appends `members` to `group`, creating the group on first use.
    pub fn extend_group<I>(&mut self, group: &str, members: I)
    where
        I: IntoIterator<Item = String>,
    {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(name, _)| name == group) {
            existing.extend(members);
        } else {
            self.entries
                .push((group.to_owned(), members.into_iter().collect()));
        }
    }

    /// Iterates `(group, members)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }
}

/// Parses hierarchy syntax (`n1 n2 - group n3 …`) into `table`.
///
/// Names accumulate in a run; a hyphen flushes the run under the group name
/// that follows; a trailing run flushes under [`DEFAULT_TYPE`]. With
/// `reject_known_groups` set (the `:types` rule) a member name that is
/// already a group key of `table` is a redefinition.
pub(crate) fn parse_grouped_names(
    items: &[Node],
    table: &mut NameTable,
    context: &str,
    reject_known_groups: bool,
) -> Result<(), Error> {
    let mut run: Vec<String> = Vec::new();
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let word = item
            .as_atom()
            .ok_or_else(|| Error::syntax(format!("expected a name in {context}")))?;
        if word == "-" {
            if run.is_empty() {
                return Err(Error::syntax(format!("unexpected hyphen in {context}")));
            }
            let group = iter.next().and_then(Node::as_atom).ok_or_else(|| {
                Error::syntax(format!("expected a group name after `-` in {context}"))
            })?;
            table.extend_group(group, run.drain(..));
        } else {
            if reject_known_groups && table.contains(word) {
                return Err(Error::Redefinition {
                    entity: "supertype",
                    name: word.to_owned(),
                });
            }
            run.push(word.to_owned());
        }
    }
    if !run.is_empty() {
        table.extend_group(DEFAULT_TYPE, run);
    }
    Ok(())
}

/// Parses a flat agent list into the registry's [`AGENT_TYPE`] group. The
/// list admits no `- type` annotations.
pub(crate) fn parse_agent_names(
    items: &[Node],
    table: &mut NameTable,
    context: &str,
) -> Result<(), Error> {
    let mut run = Vec::new();
    for item in items {
        let word = item
            .as_atom()
            .ok_or_else(|| Error::syntax(format!("expected an agent name in {context}")))?;
        if word == "-" {
            return Err(Error::syntax(format!("unexpected hyphen in {context}")));
        }
        run.push(word.to_owned());
    }
    if !run.is_empty() {
        table.extend_group(AGENT_TYPE, run);
    }
    Ok(())
}

/// Parses a typed variable list (`?a ?b - type ?c …`) into ordered
/// `(variable, type)` pairs. Variables without an annotation default to
/// [`DEFAULT_TYPE`]. Duplicates are kept in declaration order.
pub(crate) fn parse_typed_pairs(
    items: &[Node],
    context: &str,
) -> Result<Vec<(String, String)>, Error> {
    let mut pairs = Vec::new();
    let mut run: Vec<String> = Vec::new();
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let word = item
            .as_atom()
            .ok_or_else(|| Error::syntax(format!("expected a variable in {context}")))?;
        if word == "-" {
            if run.is_empty() {
                return Err(Error::syntax(format!("unexpected hyphen in {context}")));
            }
            let ty = iter.next().and_then(Node::as_atom).ok_or_else(|| {
                Error::syntax(format!("expected a type after `-` in {context}"))
            })?;
            for var in run.drain(..) {
                pairs.push((var, ty.to_owned()));
            }
        } else {
            run.push(word.to_owned());
        }
    }
    for var in run {
        pairs.push((var, DEFAULT_TYPE.to_owned()));
    }
    Ok(pairs)
}

/// Resolves a type name to the concrete objects it covers.
///
/// Walks the hierarchy breadth-first from `name` in declaration order. A
/// name that is an object-registry group contributes its objects (a leaf
/// reached through several supertypes contributes each time, keeping the
/// duplicates); a name that is only a hierarchy group expands to its
/// members. Expanding the same hierarchy group twice within one resolution
/// means the declared hierarchy is cyclic. An empty result is legal.
///
/// # Errors
///
/// [`Error::TypeResolution`] with [`TypeResolutionReason::Unknown`] for a
/// name that is neither a registry nor a hierarchy group, or
/// [`TypeResolutionReason::Cyclic`] when expansion revisits a group.
pub fn resolve_type(
    name: &str,
    types: &NameTable,
    objects: &NameTable,
) -> Result<Vec<String>, Error> {
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(name.to_owned());
    let mut expanded: HashSet<String> = HashSet::new();
    let mut resolved = Vec::new();
    while let Some(current) = queue.pop_front() {
        if let Some(members) = objects.get(&current) {
            resolved.extend(members.iter().cloned());
        } else if let Some(members) = types.get(&current) {
            if !expanded.insert(current.clone()) {
                return Err(Error::TypeResolution {
                    name: current,
                    reason: TypeResolutionReason::Cyclic,
                });
            }
            queue.extend(members.iter().cloned());
        } else {
            return Err(Error::TypeResolution {
                name: current,
                reason: TypeResolutionReason::Unknown,
            });
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    fn atoms(words: &[&str]) -> Vec<Node> {
        words.iter().map(|w| Node::Atom((*w).to_owned())).collect()
    }

    fn table(entries: &[(&str, &[&str])]) -> NameTable {
        let mut t = NameTable::new();
        for (group, members) in entries {
            t.extend_group(group, members.iter().map(|m| (*m).to_owned()));
        }
        t
    }

    #[test]
    fn extend_group_appends_to_existing_entry() {
        let mut t = NameTable::new();
        t.extend_group("block", vec!["a".to_owned()]);
        t.extend_group("block", vec!["b".to_owned()]);
        assert_eq!(t.get("block"), Some(["a".to_owned(), "b".to_owned()].as_slice()));
    }

    #[test]
    fn grouped_names_flush_runs_under_their_group() {
        let mut t = NameTable::new();
        parse_grouped_names(
            &atoms(&["b1", "b2", "-", "block", "l1", "-", "location"]),
            &mut t,
            ":constants",
            false,
        )
        .expect("parse");
        assert_eq!(t.get("block").map(<[String]>::len), Some(2));
        assert_eq!(t.get("location").map(<[String]>::len), Some(1));
    }

    #[test]
    fn trailing_run_defaults_to_object() {
        let mut t = NameTable::new();
        parse_grouped_names(&atoms(&["x", "y"]), &mut t, ":objects", false).expect("parse");
        assert_eq!(t.get(DEFAULT_TYPE).map(<[String]>::len), Some(2));
    }

    #[test]
    fn hyphen_without_pending_names_is_rejected() {
        let mut t = NameTable::new();
        let err = parse_grouped_names(&atoms(&["-", "block"]), &mut t, "types", false)
            .expect_err("hyphen first");
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn member_naming_an_existing_supertype_is_a_redefinition() {
        let mut t = NameTable::new();
        parse_grouped_names(&atoms(&["b1", "-", "block"]), &mut t, "types", true)
            .expect("first group");
        let err = parse_grouped_names(&atoms(&["block", "-", "thing"]), &mut t, "types", true)
            .expect_err("reuse");
        assert!(matches!(err, Error::Redefinition { entity: "supertype", .. }));
    }

    #[test]
    fn agent_list_registers_under_the_reserved_group() {
        let mut t = NameTable::new();
        parse_agent_names(&atoms(&["a1", "a2"]), &mut t, ":agents").expect("parse");
        assert_eq!(t.get(AGENT_TYPE).map(<[String]>::len), Some(2));
    }

    #[test]
    fn agent_list_rejects_hyphens() {
        let mut t = NameTable::new();
        let err =
            parse_agent_names(&atoms(&["a1", "-", "agent"]), &mut t, ":agents").expect_err("typed");
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn typed_pairs_keep_order_and_default_trailing_type() {
        let pairs = parse_typed_pairs(&atoms(&["?x", "?y", "-", "block", "?z"]), "parameters")
            .expect("parse");
        assert_eq!(
            pairs,
            vec![
                ("?x".to_owned(), "block".to_owned()),
                ("?y".to_owned(), "block".to_owned()),
                ("?z".to_owned(), DEFAULT_TYPE.to_owned()),
            ]
        );
    }

    #[test]
    fn resolving_a_registry_group_returns_its_objects() {
        let objects = table(&[("block", &["a", "b"])]);
        let resolved = resolve_type("block", &NameTable::new(), &objects).expect("resolve");
        assert_eq!(resolved, ["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn resolution_walks_the_hierarchy_in_declaration_order() {
        let types = table(&[("thing", &["block", "location"])]);
        let objects = table(&[("block", &["a", "b"]), ("location", &["l1"])]);
        let resolved = resolve_type("thing", &types, &objects).expect("resolve");
        assert_eq!(resolved, ["a".to_owned(), "b".to_owned(), "l1".to_owned()]);
    }

    #[test]
    fn diamond_hierarchies_contribute_leaves_per_path() {
        let types = table(&[("top", &["mid1", "mid2"]), ("mid1", &["leaf"]), ("mid2", &["leaf"])]);
        let objects = table(&[("leaf", &["x"])]);
        let resolved = resolve_type("top", &types, &objects).expect("resolve");
        assert_eq!(resolved, ["x".to_owned(), "x".to_owned()]);
    }

    #[test]
    fn registry_groups_shadow_hierarchy_groups() {
        let types = table(&[("door", &["inner"])]);
        let objects = table(&[("door", &["d1"])]);
        let resolved = resolve_type("door", &types, &objects).expect("resolve");
        assert_eq!(resolved, ["d1".to_owned()]);
    }

    #[test]
    fn cyclic_hierarchy_fails_instead_of_looping() {
        let types = table(&[("a", &["b"]), ("b", &["a"])]);
        let err = resolve_type("a", &types, &NameTable::new()).expect_err("cycle");
        assert!(matches!(
            err,
            Error::TypeResolution {
                reason: TypeResolutionReason::Cyclic,
                ..
            }
        ));
    }

    #[test]
    fn unknown_type_reports_its_name() {
        let err = resolve_type("ghost", &NameTable::new(), &NameTable::new()).expect_err("unknown");
        assert!(matches!(
            err,
            Error::TypeResolution {
                reason: TypeResolutionReason::Unknown,
                ..
            }
        ));
    }

    #[test]
    fn empty_hierarchy_group_resolves_to_nothing() {
        let mut types = NameTable::new();
        types.extend_group("phantom", Vec::new());
        let resolved = resolve_type("phantom", &types, &NameTable::new()).expect("resolve");
        assert!(resolved.is_empty());
    }
}
