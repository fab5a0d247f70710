//! Variable mappings between a child atom and a parent atom.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{variable::Variable, FxIndexSet};

/// A mapping from child variables to parent variables.
///
/// While a unifier is being assembled a child variable may map to several parents. Only
/// functional, injective unifiers are ever returned from unification.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Unifier {
    mappings: BTreeMap<Variable, BTreeSet<Variable>>,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the pair was not already present.
    pub fn insert(&mut self, child: Variable, parent: Variable) -> bool {
        self.mappings.entry(child).or_default().insert(parent)
    }

    /// Adds every mapping of `other` to this unifier.
    pub fn merge(&mut self, other: &Unifier) {
        for (child, parent) in other.mappings() {
            self.insert(child.clone(), parent.clone());
        }
    }

    pub fn merged(mut self, other: &Unifier) -> Self {
        self.merge(other);
        self
    }

    pub fn inverse(&self) -> Unifier {
        self.mappings()
            .map(|(child, parent)| (parent.clone(), child.clone()))
            .collect()
    }

    /// Drops `x -> x` pairs.
    pub fn without_trivial(&self) -> Unifier {
        self.mappings()
            .filter(|(child, parent)| child != parent)
            .map(|(child, parent)| (child.clone(), parent.clone()))
            .collect()
    }

    /// Whether every child variable maps to at most one parent.
    pub fn is_functional(&self) -> bool {
        self.mappings.values().all(|parents| parents.len() <= 1)
    }

    /// Whether no two child variables map to the same parent.
    pub fn is_injective(&self) -> bool {
        let mut seen = BTreeSet::new();

        self.mappings
            .values()
            .flatten()
            .all(|parent| seen.insert(parent))
    }

    pub fn get(&self, child: &Variable) -> impl Iterator<Item = &Variable> {
        self.mappings.get(child).into_iter().flatten()
    }

    /// The parent `child` maps to, or `child` itself when it is unmapped.
    pub fn apply(&self, child: &Variable) -> Variable {
        self.get(child).next().unwrap_or(child).clone()
    }

    pub fn contains_key(&self, child: &Variable) -> bool {
        self.mappings.contains_key(child)
    }

    pub fn contains(&self, child: &Variable, parent: &Variable) -> bool {
        self.mappings
            .get(child)
            .is_some_and(|parents| parents.contains(parent))
    }

    pub fn mappings(&self) -> impl Iterator<Item = (&Variable, &Variable)> {
        self.mappings
            .iter()
            .flat_map(|(child, parents)| parents.iter().map(move |parent| (child, parent)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Variable> {
        self.mappings.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Variable> {
        self.mappings.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.mappings.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl FromIterator<(Variable, Variable)> for Unifier {
    fn from_iter<T: IntoIterator<Item = (Variable, Variable)>>(iter: T) -> Self {
        let mut unifier = Unifier::new();

        for (child, parent) in iter {
            unifier.insert(child, parent);
        }

        unifier
    }
}

impl<const N: usize> From<[(Variable, Variable); N]> for Unifier {
    fn from(pairs: [(Variable, Variable); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for Unifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;

        for (index, (child, parent)) in self.mappings().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }

            write!(f, "{child} -> {parent}")?;
        }

        f.write_str("}")
    }
}

/// Every valid alternative unifier between two atoms, in discovery order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MultiUnifier {
    unifiers: FxIndexSet<Unifier>,
}

impl MultiUnifier {
    /// The unifier set of two atoms that match without renaming anything.
    pub fn trivial() -> Self {
        Self::from(Unifier::new())
    }

    /// The unifier set of two atoms that do not match.
    pub fn non_existent() -> Self {
        Self::default()
    }

    pub fn is_trivial(&self) -> bool {
        self.unifiers.len() == 1 && self.unifiers.iter().all(Unifier::is_empty)
    }

    pub fn is_empty(&self) -> bool {
        self.unifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.unifiers.len()
    }

    /// The unifier, when it is unique.
    pub fn unifier(&self) -> Option<&Unifier> {
        match self.unifiers.len() {
            1 => self.unifiers.first(),
            _ => None,
        }
    }

    pub fn contains(&self, unifier: &Unifier) -> bool {
        self.unifiers.contains(unifier)
    }

    pub fn insert(&mut self, unifier: Unifier) -> bool {
        self.unifiers.insert(unifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unifier> {
        self.unifiers.iter()
    }

    pub fn inverse(&self) -> MultiUnifier {
        self.unifiers.iter().map(Unifier::inverse).collect()
    }
}

impl From<Unifier> for MultiUnifier {
    fn from(unifier: Unifier) -> Self {
        std::iter::once(unifier).collect()
    }
}

impl FromIterator<Unifier> for MultiUnifier {
    fn from_iter<T: IntoIterator<Item = Unifier>>(iter: T) -> Self {
        Self {
            unifiers: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MultiUnifier {
    type Item = Unifier;
    type IntoIter = indexmap::set::IntoIter<Unifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.unifiers.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiUnifier {
    type Item = &'a Unifier;
    type IntoIter = indexmap::set::Iter<'a, Unifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.unifiers.iter()
    }
}

impl fmt::Display for MultiUnifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;

        for (index, unifier) in self.unifiers.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }

            unifier.fmt(f)?;
        }

        f.write_str("]")
    }
}
