//! Equivalence of atoms at three levels of strictness, each paired with a consistent hash.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::{
    atom::{AtomKind, AtomRef},
    id::ConceptId,
    predicate::{Comparator, ValueOperation},
    unification::UnifierType,
};

/// How strictly two atoms must match to count as the same.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AtomicEquivalence {
    /// Same variables, types, role players and predicates.
    Equality,
    /// Equal up to a consistent renaming of variables. Bound constants must match.
    AlphaEquivalence,
    /// Equal up to a consistent renaming of variables, ignoring bound constants.
    StructuralEquivalence,
}

impl AtomicEquivalence {
    fn cache_index(self) -> usize {
        match self {
            AtomicEquivalence::Equality => 0,
            AtomicEquivalence::AlphaEquivalence => 1,
            AtomicEquivalence::StructuralEquivalence => 2,
        }
    }

    pub fn equivalent(self, a: &AtomRef<'_, '_>, b: &AtomRef<'_, '_>) -> bool {
        match self {
            AtomicEquivalence::Equality => is_equal(a, b),
            AtomicEquivalence::AlphaEquivalence => {
                is_base_equivalent(a, b) && has_bijection(a, b, UnifierType::Exact)
            }
            AtomicEquivalence::StructuralEquivalence => {
                is_base_equivalent(a, b) && has_bijection(a, b, UnifierType::Structural)
            }
        }
    }

    /// A hash equal for any two atoms equivalent at this level. Computed once per atom.
    pub fn hash(self, atom: &AtomRef<'_, '_>) -> u64 {
        *atom.cache.hashes[self.cache_index()].get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.hash_into(atom, &mut hasher);

            hasher.finish()
        })
    }

    fn id_signature(self, id: Option<ConceptId>) -> IdSignature {
        match self {
            AtomicEquivalence::StructuralEquivalence => IdSignature::Bound(id.is_some()),
            _ => IdSignature::Id(id),
        }
    }

    fn values_signature(self, values: &[ValueOperation]) -> ValuesSignature {
        match self {
            AtomicEquivalence::StructuralEquivalence => {
                ValuesSignature::Comparators(values.iter().map(|value| value.comparator).collect())
            }
            _ => ValuesSignature::Values(values.to_vec()),
        }
    }

    fn hash_into(self, atom: &AtomRef<'_, '_>, hasher: &mut FxHasher) {
        atom.atom_type().hash(hasher);
        atom.type_id().hash(hasher);
        atom.is_direct().hash(hasher);

        if self == AtomicEquivalence::Equality {
            atom.var().hash(hasher);
            atom.type_var().hash(hasher);

            let mut castings = atom.castings().iter().collect::<Vec<_>>();
            castings.sort();
            castings.hash(hasher);

            if let AtomKind::Resource {
                attribute,
                relation,
                values,
            } = atom.kind()
            {
                (attribute, relation, values).hash(hasher);
            }

            let mut vars = atom.var_names();
            vars.sort();

            for var in &vars {
                (atom.id_of(var), atom.values_of(var), atom.var_type(var)).hash(hasher);
            }

            return;
        }

        atom.var().is_user_defined().hash(hasher);
        atom.type_var().map(|var| var.is_user_defined()).hash(hasher);
        self.id_signature(atom.id_of(atom.var())).hash(hasher);

        match atom.kind() {
            AtomKind::Relationship { castings } => {
                let mut signatures = castings
                    .iter()
                    .map(|casting| {
                        (
                            casting.role,
                            casting.has_user_defined_role_var(),
                            atom.var_type(&casting.player),
                            self.id_signature(atom.id_of(&casting.player)),
                            self.values_signature(&atom.values_of(&casting.player)),
                        )
                    })
                    .collect::<Vec<_>>();

                signatures.sort();
                signatures.hash(hasher);
            }
            AtomKind::Resource {
                attribute,
                relation,
                values,
            } => {
                atom.var_type(atom.var()).hash(hasher);
                self.id_signature(atom.id_of(attribute)).hash(hasher);
                self.values_signature(values).hash(hasher);
                relation.as_ref().map(|var| var.is_user_defined()).hash(hasher);
            }
            _ => {
                self.values_signature(&atom.values_of(atom.var()))
                    .hash(hasher);
            }
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum IdSignature {
    Id(Option<ConceptId>),
    Bound(bool),
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ValuesSignature {
    Values(Vec<ValueOperation>),
    Comparators(Vec<Comparator>),
}

fn is_equal(a: &AtomRef<'_, '_>, b: &AtomRef<'_, '_>) -> bool {
    a.atom() == b.atom()
        && a.var_names().iter().all(|var| {
            a.id_of(var) == b.id_of(var)
                && a.values_of(var) == b.values_of(var)
                && a.var_type(var) == b.var_type(var)
        })
}

/// Agreement on everything that does not depend on variable names.
fn is_base_equivalent(a: &AtomRef<'_, '_>, b: &AtomRef<'_, '_>) -> bool {
    let sorted_roles = |atom: &AtomRef<'_, '_>| {
        let mut roles = atom
            .castings()
            .iter()
            .map(|casting| casting.role)
            .collect::<Vec<_>>();

        roles.sort();
        roles
    };

    a.atom_type() == b.atom_type()
        && a.type_id() == b.type_id()
        && a.is_direct() == b.is_direct()
        && a.castings().len() == b.castings().len()
        && a.var().is_user_defined() == b.var().is_user_defined()
        && a.type_var().map(|var| var.is_user_defined())
            == b.type_var().map(|var| var.is_user_defined())
        && a.relation_var().map(|var| var.is_user_defined())
            == b.relation_var().map(|var| var.is_user_defined())
        && sorted_roles(a) == sorted_roles(b)
}

fn has_bijection(a: &AtomRef<'_, '_>, b: &AtomRef<'_, '_>, unifier_type: UnifierType) -> bool {
    a.unify(b, unifier_type)
        .is_ok_and(|unifiers| !unifiers.is_empty())
}

impl AtomRef<'_, '_> {
    pub fn is_equivalent(&self, other: &AtomRef<'_, '_>, equivalence: AtomicEquivalence) -> bool {
        equivalence.equivalent(self, other)
    }

    pub fn equivalence_hash(&self, equivalence: AtomicEquivalence) -> u64 {
        equivalence.hash(self)
    }
}

/// An atom keyed by one equivalence level, for use in hash maps and sets.
#[derive(Clone, Copy, Debug)]
pub struct Equivalent<'a, 's> {
    pub atom: AtomRef<'a, 's>,
    pub equivalence: AtomicEquivalence,
}

impl<'a, 's> Equivalent<'a, 's> {
    pub fn new(atom: AtomRef<'a, 's>, equivalence: AtomicEquivalence) -> Self {
        Self { atom, equivalence }
    }
}

impl PartialEq for Equivalent<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        self.equivalence == other.equivalence
            && self.equivalence.equivalent(&self.atom, &other.atom)
    }
}

impl Eq for Equivalent<'_, '_> {}

impl Hash for Equivalent<'_, '_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.equivalence.hash(&self.atom).hash(state);
    }
}
