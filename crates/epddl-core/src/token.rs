// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lexer and source normalizer.
//!
//! E-PDDL is a Lisp-style surface syntax extended with `[a1 a2]` agent
//! brackets. Scanning runs in three stages: textual normalization (comment
//! stripping, case folding, the rewrite passes below), tokenization, and
//! tree building. Bracket groups come out of the tree builder as typed
//! [`EpistemicOp`] markers instead of synthesized token text, so no stage
//! downstream ever sniffs strings for operator prefixes.

use crate::error::Error;
use crate::fluent::EpistemicOp;
use regex::Regex;

/// One node of the scanned token tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A bare word token (already lowercased).
    Atom(String),
    /// A parenthesized group.
    List(Vec<Node>),
    /// An agent bracket group, scoping the tokens that follow it in the
    /// enclosing list (merged form) or the single next sublist (spaced form).
    Marker(EpistemicOp),
}

impl Node {
    /// The atom text, when this node is an atom.
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// The child slice, when this node is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Raw lexical token classes.
enum RawToken {
    Open,
    Close,
    BracketOpen,
    BracketClose,
    Word(String),
}

/// Strips `;` comments, lowercases, and applies the rewrite passes:
///
/// 1. drop a trailing `-agent` suffix inside a bracket group
///    (`[a1 -agent]` → `[a1 ]`);
/// 2. to fixpoint, collapse a parenthesized group whose sole content is a
///    flat parenthesized group (`( (x y) )` → `x y`);
/// 3. to fixpoint, merge a bracket group immediately followed by a flat
///    parenthesized group (`[a1](p x)` → `[a1]p x`).
///
/// Each rewrite pass runs to its own fixpoint before the next, so no pass
/// ever sees its own residue. Scanning normalizes exactly once.
///
/// # Errors
///
/// Returns [`Error::Syntax`] if a rewrite pattern fails to compile, which
/// indicates a build defect rather than bad input.
pub fn normalize(source: &str) -> Result<String, Error> {
    let agent_suffix = pattern(r"\[([^\[]+)-agent\s*\]")?;
    let collapse = pattern(r"\(\s*\(([^()]+)\)\s*\)")?;
    let merge = pattern(r"(\[[^\[]+\])\(([^(]+)\)")?;

    let mut text = fold_case(source);
    text = agent_suffix.replace_all(&text, "[$1]").into_owned();
    text = rewrite_to_fixpoint(&collapse, &text, "$1");
    text = rewrite_to_fixpoint(&merge, &text, "$1$2");
    Ok(text)
}

/// Scans a whole source file into its single root expression.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for unbalanced parentheses, bracket misuse
/// (empty, nested, unterminated, containing parentheses, or closed outside
/// any open list), or when the source does not reduce to exactly one
/// top-level expression.
pub fn scan(source: &str) -> Result<Node, Error> {
    let text = normalize(source)?;
    build_tree(&tokenize(&text))
}

/// Removes `;` comments to end of line and lowercases everything else.
fn fold_case(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let code = match line.find(';') {
            Some(i) => &line[..i],
            None => line,
        };
        out.push_str(&code.to_lowercase());
        out.push('\n');
    }
    out
}

fn pattern(re: &str) -> Result<Regex, Error> {
    Regex::new(re).map_err(|err| Error::syntax(format!("internal rewrite pattern: {err}")))
}

/// Applies `re → rep` until the text stops changing.
fn rewrite_to_fixpoint(re: &Regex, text: &str, rep: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let next = re.replace_all(&current, rep);
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

/// Splits normalized text into parenthesis/bracket tokens and word runs.
fn tokenize(text: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for ch in text.chars() {
        let token = match ch {
            '(' => Some(RawToken::Open),
            ')' => Some(RawToken::Close),
            '[' => Some(RawToken::BracketOpen),
            ']' => Some(RawToken::BracketClose),
            c if c.is_whitespace() => None,
            c => {
                word.push(c);
                continue;
            }
        };
        if !word.is_empty() {
            tokens.push(RawToken::Word(std::mem::take(&mut word)));
        }
        if let Some(token) = token {
            tokens.push(token);
        }
    }
    if !word.is_empty() {
        tokens.push(RawToken::Word(word));
    }
    tokens
}

/// Builds the token tree with an explicit list stack. The bottom of the
/// stack is the root collector, which must hold exactly one expression when
/// the input ends.
fn build_tree(tokens: &[RawToken]) -> Result<Node, Error> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    let mut agents: Option<Vec<String>> = None;

    for token in tokens {
        match token {
            RawToken::Open => {
                if agents.is_some() {
                    return Err(Error::syntax("parenthesis inside an agent group"));
                }
                stack.push(Vec::new());
            }
            RawToken::Close => {
                if agents.is_some() {
                    return Err(Error::syntax("parenthesis inside an agent group"));
                }
                let done = match stack.pop() {
                    Some(done) if !stack.is_empty() => done,
                    _ => return Err(Error::syntax("missing open parenthesis")),
                };
                if let Some(open) = stack.last_mut() {
                    open.push(Node::List(done));
                }
            }
            RawToken::BracketOpen => {
                if agents.is_some() {
                    return Err(Error::syntax("agent group nested inside an agent group"));
                }
                if stack.len() == 1 {
                    return Err(Error::syntax("agent group outside any open parenthesis"));
                }
                agents = Some(Vec::new());
            }
            RawToken::BracketClose => {
                let collected = agents
                    .take()
                    .ok_or_else(|| Error::syntax("unmatched closing bracket"))?;
                if collected.is_empty() {
                    return Err(Error::syntax("empty agent group"));
                }
                if let Some(open) = stack.last_mut() {
                    open.push(Node::Marker(EpistemicOp::new(collected)));
                }
            }
            RawToken::Word(w) => match agents.as_mut() {
                Some(collected) => collected.push(w.clone()),
                None => {
                    if let Some(open) = stack.last_mut() {
                        open.push(Node::Atom(w.clone()));
                    }
                }
            },
        }
    }

    if agents.is_some() {
        return Err(Error::syntax("unterminated agent group"));
    }
    if stack.len() != 1 {
        return Err(Error::syntax("missing close parenthesis"));
    }
    let mut root = match stack.pop() {
        Some(root) => root,
        None => return Err(Error::syntax("missing close parenthesis")),
    };
    if root.len() != 1 {
        return Err(Error::syntax(
            "expected exactly one top-level expression in file",
        ));
    }
    Ok(root.swap_remove(0))
}
