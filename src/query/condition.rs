//! Arena-backed condition trees.
//!
//! Clauses are addressed by [`ClauseId`], a stable index into the arena, so coverage
//! bookkeeping tracks clause identity rather than structural equality: two clauses that
//! happen to render the same are still distinct entries in a coverage set.

use std::fmt;

use crate::query::{PredicateKind, Value};
use crate::schema::RelationType;
use crate::types::KeyId;

/// Stable identity of a node inside a [`ConditionTree`].
///
/// A tree holds at most `u32::MAX` nodes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ClauseId(u32);

impl ClauseId {
    fn from_position(position: usize) -> Self {
        let raw = u32::try_from(position);
        debug_assert!(raw.is_ok(), "condition tree exceeds u32::MAX nodes");
        ClauseId(raw.unwrap_or(u32::MAX))
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resolved leaf predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct PredicateCondition {
    /// Resolved key the predicate applies to.
    pub key: RelationType,
    /// Comparison operator.
    pub predicate: PredicateKind,
    /// Operand; `None` for existence checks.
    pub value: Option<Value>,
}

impl PredicateCondition {
    /// Creates a literal.
    pub fn new(key: RelationType, predicate: PredicateKind, value: Option<Value>) -> Self {
        Self {
            key,
            predicate,
            value,
        }
    }
}

impl fmt::Display for PredicateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.predicate) {
            (None, PredicateKind::Equal) => write!(f, "!has({})", self.key.name()),
            (None, PredicateKind::NotEqual) => write!(f, "has({})", self.key.name()),
            (None, predicate) => write!(f, "{} {predicate} null", self.key.name()),
            (Some(value), predicate) => write!(f, "{} {predicate} {value}", self.key.name()),
        }
    }
}

/// Node of a condition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Leaf predicate.
    Literal(PredicateCondition),
    /// Conjunction of child nodes.
    And(Vec<ClauseId>),
    /// Disjunction of child nodes.
    Or(Vec<ClauseId>),
    /// Negation of a child node.
    Not(ClauseId),
}

/// Condition tree whose root is always a conjunction.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionTree {
    nodes: Vec<Condition>,
    root: ClauseId,
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionTree {
    /// Creates a tree holding an empty top-level conjunction.
    pub fn new() -> Self {
        Self {
            nodes: vec![Condition::And(Vec::new())],
            root: ClauseId(0),
        }
    }

    /// The top-level conjunction.
    pub fn root(&self) -> ClauseId {
        self.root
    }

    /// Node stored under `id`.
    ///
    /// Panics if `id` was issued by a different tree and is out of range.
    pub fn get(&self, id: ClauseId) -> &Condition {
        &self.nodes[id.index()]
    }

    /// Children of the top-level conjunction, in insertion order.
    pub fn clauses(&self) -> &[ClauseId] {
        self.children(self.root)
    }

    /// Number of top-level clauses.
    pub fn num_clauses(&self) -> usize {
        self.clauses().len()
    }

    /// Whether the conjunction has no clauses, i.e. matches everything.
    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }

    /// Children of a compound node; empty for literals.
    pub fn children(&self, id: ClauseId) -> &[ClauseId] {
        match self.get(id) {
            Condition::And(children) | Condition::Or(children) => children,
            Condition::Not(child) => std::slice::from_ref(child),
            Condition::Literal(_) => &[],
        }
    }

    /// The literal stored under `id`, if that node is a literal.
    pub fn literal(&self, id: ClauseId) -> Option<&PredicateCondition> {
        match self.get(id) {
            Condition::Literal(atom) => Some(atom),
            _ => None,
        }
    }

    /// Allocates a detached literal node.
    pub fn new_literal(&mut self, atom: PredicateCondition) -> ClauseId {
        self.push(Condition::Literal(atom))
    }

    /// Allocates a detached disjunction over existing nodes.
    pub fn new_or(&mut self, children: Vec<ClauseId>) -> ClauseId {
        self.push(Condition::Or(children))
    }

    /// Allocates a detached conjunction over existing nodes.
    pub fn new_and(&mut self, children: Vec<ClauseId>) -> ClauseId {
        self.push(Condition::And(children))
    }

    /// Allocates a detached negation of an existing node.
    pub fn new_not(&mut self, child: ClauseId) -> ClauseId {
        self.push(Condition::Not(child))
    }

    /// Attaches a node as a new top-level clause.
    pub fn add_clause(&mut self, clause: ClauseId) {
        let root = self.root.index();
        if let Condition::And(children) = &mut self.nodes[root] {
            children.push(clause);
        }
    }

    /// Allocates a literal and attaches it at the top level.
    pub fn add_literal(&mut self, atom: PredicateCondition) -> ClauseId {
        let id = self.new_literal(atom);
        self.add_clause(id);
        id
    }

    fn push(&mut self, condition: Condition) -> ClauseId {
        let id = ClauseId::from_position(self.nodes.len());
        self.nodes.push(condition);
        id
    }

    /// Every literal reachable from the root, depth first.
    pub fn literals(&self) -> Vec<(ClauseId, &PredicateCondition)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.get(id) {
                Condition::Literal(atom) => out.push((id, atom)),
                _ => stack.extend(self.children(id).iter().rev().copied()),
            }
        }
        out
    }

    /// Whether the tree is a conjunction of literals and single-key disjunctions of literals.
    pub fn is_normal_form(&self) -> bool {
        self.clauses().iter().all(|&clause| match self.get(clause) {
            Condition::Literal(_) => true,
            Condition::Or(children) => {
                let mut key = None;
                children.iter().all(|&child| match self.literal(child) {
                    Some(atom) => *key.get_or_insert(atom.key.id()) == atom.key.id(),
                    None => false,
                })
            }
            Condition::And(_) | Condition::Not(_) => false,
        })
    }

    /// Finds the first top-level clause that pins `key` to a set of values by equality,
    /// either a single `key = v` literal or a disjunction of such literals.
    pub fn equality_values(&self, key: KeyId) -> Option<(ClauseId, Vec<&Value>)> {
        for &clause in self.clauses() {
            match self.get(clause) {
                Condition::Or(_) => {
                    if let Some((or_key, values)) = self.or_equalities(clause) {
                        if or_key == key && !values.is_empty() {
                            return Some((clause, values));
                        }
                    }
                }
                Condition::Literal(atom) => {
                    if atom.key.id() == key && atom.predicate.is_equality() {
                        if let Some(value) = &atom.value {
                            return Some((clause, vec![value]));
                        }
                    }
                }
                Condition::And(_) | Condition::Not(_) => {}
            }
        }
        None
    }

    /// When `or_clause` is a disjunction of non-null equalities on one key, returns that
    /// key and the values.
    pub fn or_equalities(&self, or_clause: ClauseId) -> Option<(KeyId, Vec<&Value>)> {
        let Condition::Or(children) = self.get(or_clause) else {
            return None;
        };
        let mut master = None;
        let mut values = Vec::with_capacity(children.len());
        for &child in children {
            let atom = self.literal(child)?;
            if !atom.predicate.is_equality() {
                return None;
            }
            let value = atom.value.as_ref()?;
            let key = *master.get_or_insert(atom.key.id());
            if key != atom.key.id() {
                return None;
            }
            values.push(value);
        }
        master.map(|key| (key, values))
    }

    /// Copies the given clauses (and their subtrees) into a fresh conjunction.
    pub fn project(&self, clauses: &[ClauseId]) -> ConditionTree {
        let mut out = ConditionTree::new();
        for &clause in clauses {
            let copied = out.copy_subtree(self, clause);
            out.add_clause(copied);
        }
        out
    }

    fn copy_subtree(&mut self, from: &ConditionTree, id: ClauseId) -> ClauseId {
        match from.get(id) {
            Condition::Literal(atom) => self.new_literal(atom.clone()),
            Condition::And(children) => {
                let copied = children
                    .iter()
                    .map(|&child| self.copy_subtree(from, child))
                    .collect();
                self.new_and(copied)
            }
            Condition::Or(children) => {
                let copied = children
                    .iter()
                    .map(|&child| self.copy_subtree(from, child))
                    .collect();
                self.new_or(copied)
            }
            Condition::Not(child) => {
                let copied = self.copy_subtree(from, *child);
                self.new_not(copied)
            }
        }
    }

    fn fmt_node(&self, id: ClauseId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get(id) {
            Condition::Literal(atom) => write!(f, "{atom}"),
            Condition::Not(child) => {
                f.write_str("NOT ")?;
                self.fmt_node(*child, f)
            }
            Condition::And(children) | Condition::Or(children) => {
                let sep = if matches!(self.get(id), Condition::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                f.write_str("(")?;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(sep)?;
                    }
                    self.fmt_node(*child, f)?;
                }
                f.write_str(")")
            }
        }
    }

    /// Renders a single clause of this tree.
    pub fn display_clause(&self, id: ClauseId) -> ClauseDisplay<'_> {
        ClauseDisplay { tree: self, id }
    }
}

impl fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

/// Display adapter returned by [`ConditionTree::display_clause`].
pub struct ClauseDisplay<'a> {
    tree: &'a ConditionTree,
    id: ClauseId,
}

impl fmt::Display for ClauseDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_node(self.id, f)
    }
}
