//! Unification of a child atom against a parent atom.
//!
//! Relationships are the hard case: role players have to be paired up, and when roles are left
//! open several pairings may be valid at once. Every valid pairing yields one unifier.

use tracing::{debug, trace};

use crate::{
    atom::{AtomKind, AtomRef, AtomType, Casting},
    equivalence::AtomicEquivalence,
    error::{ReasonerError, ReasonerResult},
    id::ConceptId,
    predicate::ValueOperation,
    schema::{self, TypeSystem},
    unifier::{MultiUnifier, Unifier},
    variable::Variable,
};

/// How strictly the contents of two atoms have to agree for them to unify.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnifierType {
    /// Types, roles and predicates are equal.
    Exact,
    /// Types and roles are equal. Predicates only need the same shape.
    Structural,
    /// The child is at least as specific as the parent.
    Subsumptive,
    /// The child, a rule head, can produce some answers to the parent, a query atom.
    Rule,
}

fn is_meta_or_unknown(type_system: &dyn TypeSystem, concept: Option<ConceptId>) -> bool {
    concept.map_or(true, |concept| schema::is_meta(type_system, concept))
}

fn is_subsumed_by(
    type_system: &dyn TypeSystem,
    child: Option<ConceptId>,
    parent: Option<ConceptId>,
) -> bool {
    match (child, parent) {
        (_, None) => true,
        (Some(child), Some(parent)) => schema::is_subtype_or_equal(type_system, child, parent),
        (None, Some(_)) => false,
    }
}

impl UnifierType {
    /// Compatibility of the types of the two atoms themselves.
    pub fn type_compatible(
        self,
        type_system: &dyn TypeSystem,
        child: Option<ConceptId>,
        parent: Option<ConceptId>,
    ) -> bool {
        match self {
            UnifierType::Exact | UnifierType::Structural => child == parent,
            UnifierType::Subsumptive => is_subsumed_by(type_system, child, parent),
            UnifierType::Rule => child.is_none() || is_subsumed_by(type_system, child, parent),
        }
    }

    pub fn role_compatible(
        self,
        type_system: &dyn TypeSystem,
        child: &Casting,
        parent: &Casting,
    ) -> bool {
        match self {
            UnifierType::Exact | UnifierType::Structural => {
                child.role == parent.role
                    && child.has_user_defined_role_var() == parent.has_user_defined_role_var()
            }
            UnifierType::Subsumptive => {
                is_meta_or_unknown(type_system, parent.role)
                    || is_subsumed_by(type_system, child.role, parent.role)
            }
            UnifierType::Rule => {
                is_meta_or_unknown(type_system, parent.role)
                    || is_meta_or_unknown(type_system, child.role)
                    || is_subsumed_by(type_system, child.role, parent.role)
            }
        }
    }

    /// Compatibility of the types of two role players, or of two owners.
    pub fn player_type_compatible(
        self,
        type_system: &dyn TypeSystem,
        child: Option<ConceptId>,
        parent: Option<ConceptId>,
    ) -> bool {
        match self {
            UnifierType::Exact | UnifierType::Structural => child == parent,
            UnifierType::Subsumptive => is_subsumed_by(type_system, child, parent),
            UnifierType::Rule => match (child, parent) {
                (Some(child), Some(parent)) => !schema::are_disjoint(type_system, child, parent),
                _ => true,
            },
        }
    }

    pub fn id_compatible(self, child: Option<ConceptId>, parent: Option<ConceptId>) -> bool {
        match self {
            UnifierType::Exact => child == parent,
            UnifierType::Structural => child.is_some() == parent.is_some(),
            UnifierType::Subsumptive => parent.is_none() || child == parent,
            UnifierType::Rule => child.is_none() || parent.is_none() || child == parent,
        }
    }

    /// Compatibility of the value operations on two variables. Both slices are sorted.
    pub fn values_compatible(self, child: &[ValueOperation], parent: &[ValueOperation]) -> bool {
        match self {
            UnifierType::Exact => child == parent,
            UnifierType::Structural => child
                .iter()
                .map(|value| value.comparator)
                .eq(parent.iter().map(|value| value.comparator)),
            UnifierType::Subsumptive => parent
                .iter()
                .all(|parent| child.iter().any(|child| parent.subsumes(child))),
            UnifierType::Rule => parent.iter().all(|parent| {
                child
                    .iter()
                    .all(|child| parent.is_compatible_with(child))
            }),
        }
    }

    /// Whether a child with `child` role players can cover a parent with `parent` of them.
    fn arity_compatible(self, child: usize, parent: usize) -> bool {
        match self {
            UnifierType::Exact | UnifierType::Structural => child == parent,
            UnifierType::Subsumptive | UnifierType::Rule => child >= parent,
        }
    }
}

fn finish(unifiers: impl IntoIterator<Item = Unifier>) -> MultiUnifier {
    unifiers
        .into_iter()
        .filter(|unifier| unifier.is_functional() && unifier.is_injective())
        .map(|unifier| unifier.without_trivial())
        .collect()
}

fn map_if_named(unifier: &mut Unifier, child: Option<&Variable>, parent: Option<&Variable>) {
    if let (Some(child), Some(parent)) = (child, parent) {
        if child.is_user_defined() && parent.is_user_defined() {
            unifier.insert(child.clone(), parent.clone());
        }
    }
}

/// The child casting indices compatible with each parent casting.
fn compatible_castings(
    child: &AtomRef<'_, '_>,
    parent: &AtomRef<'_, '_>,
    unifier_type: UnifierType,
) -> Vec<Vec<usize>> {
    let type_system = parent.schema();
    let child_types = child.query().var_type_map();
    let parent_types = parent.query().var_type_map();

    parent
        .castings()
        .iter()
        .map(|parent_casting| {
            let parent_player = &parent_casting.player;
            let parent_type = parent_types.get(parent_player).copied();
            let parent_id = parent.id_of(parent_player);
            let parent_values = parent.values_of(parent_player);

            child
                .castings()
                .iter()
                .enumerate()
                .filter(|(_, child_casting)| {
                    let child_player = &child_casting.player;

                    unifier_type.role_compatible(type_system, child_casting, parent_casting)
                        && unifier_type.player_type_compatible(
                            type_system,
                            child_types.get(child_player).copied(),
                            parent_type,
                        )
                        && unifier_type.id_compatible(child.id_of(child_player), parent_id)
                        && unifier_type
                            .values_compatible(&child.values_of(child_player), &parent_values)
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect()
}

fn extend_mappings(
    candidates: &[Vec<usize>],
    used: &mut [bool],
    current: &mut Vec<(usize, usize)>,
    mappings: &mut Vec<Vec<(usize, usize)>>,
) {
    let parent_index = current.len();

    let Some(parent_candidates) = candidates.get(parent_index) else {
        mappings.push(current.clone());
        return;
    };

    for &child_index in parent_candidates {
        if used[child_index] {
            continue;
        }

        used[child_index] = true;
        current.push((child_index, parent_index));

        extend_mappings(candidates, used, current, mappings);

        current.pop();
        used[child_index] = false;
    }
}

/// Every pairing of child castings with parent castings that covers the parent and uses each
/// child casting at most once. Pairs are `(child index, parent index)`.
///
/// Pairings are not checked for consistency at the variable level, a child variable playing two
/// roles may be paired with two different parent variables.
pub(crate) fn relation_player_mappings(
    child: &AtomRef<'_, '_>,
    parent: &AtomRef<'_, '_>,
    unifier_type: UnifierType,
) -> Vec<Vec<(usize, usize)>> {
    let type_system = parent.schema();

    if !unifier_type.arity_compatible(child.castings().len(), parent.castings().len())
        || !unifier_type.type_compatible(type_system, child.type_id(), parent.type_id())
        || !unifier_type.id_compatible(child.id_of(child.var()), parent.id_of(parent.var()))
    {
        return Vec::new();
    }

    let candidates = compatible_castings(child, parent, unifier_type);
    trace!(?candidates, "compatible role players");

    let mut mappings = Vec::new();

    extend_mappings(
        &candidates,
        &mut vec![false; child.castings().len()],
        &mut Vec::with_capacity(candidates.len()),
        &mut mappings,
    );

    mappings
}

fn relation_unifiers(
    child: &AtomRef<'_, '_>,
    parent: &AtomRef<'_, '_>,
    unifier_type: UnifierType,
) -> MultiUnifier {
    let mut base = Unifier::new();

    if parent.var().is_user_defined() {
        base.insert(child.var().clone(), parent.var().clone());
    }
    map_if_named(&mut base, child.type_var(), parent.type_var());

    let unifiers = relation_player_mappings(child, parent, unifier_type)
        .into_iter()
        .map(|mapping| {
            let mut unifier = base.clone();

            for (child_index, parent_index) in mapping {
                let child_casting = &child.castings()[child_index];
                let parent_casting = &parent.castings()[parent_index];

                unifier.insert(child_casting.player.clone(), parent_casting.player.clone());

                if let (Some(child_role), Some(parent_role)) =
                    (&child_casting.role_var, &parent_casting.role_var)
                {
                    if child_role.is_user_defined() || parent_role.is_user_defined() {
                        unifier.insert(child_role.clone(), parent_role.clone());
                    }
                }
            }

            unifier
        });

    finish(unifiers)
}

fn resource_unifier(
    child: &AtomRef<'_, '_>,
    parent: &AtomRef<'_, '_>,
    unifier_type: UnifierType,
) -> MultiUnifier {
    let (
        AtomKind::Resource {
            attribute: child_attribute,
            relation: child_relation,
            values: child_values,
        },
        AtomKind::Resource {
            attribute: parent_attribute,
            relation: parent_relation,
            values: parent_values,
        },
    ) = (child.kind(), parent.kind())
    else {
        return MultiUnifier::non_existent();
    };
    let type_system = parent.schema();

    let compatible = unifier_type.type_compatible(type_system, child.type_id(), parent.type_id())
        && unifier_type.player_type_compatible(
            type_system,
            child.var_type(child.var()),
            parent.var_type(parent.var()),
        )
        && unifier_type.id_compatible(child.id_of(child.var()), parent.id_of(parent.var()))
        && unifier_type.id_compatible(child.id_of(child_attribute), parent.id_of(parent_attribute))
        && unifier_type.values_compatible(child_values, parent_values);

    if !compatible {
        return MultiUnifier::non_existent();
    }

    let mut unifier = Unifier::from([
        (child.var().clone(), parent.var().clone()),
        (child_attribute.clone(), parent_attribute.clone()),
    ]);

    if let (Some(child_relation), Some(parent_relation)) = (child_relation, parent_relation) {
        if parent_relation.is_user_defined() {
            unifier.insert(child_relation.clone(), parent_relation.clone());
        }
    }

    finish([unifier])
}

fn binary_unifier(
    child: &AtomRef<'_, '_>,
    parent: &AtomRef<'_, '_>,
    unifier_type: UnifierType,
) -> MultiUnifier {
    let type_system = parent.schema();

    let direct_compatible = match unifier_type {
        UnifierType::Exact | UnifierType::Structural => child.is_direct() == parent.is_direct(),
        UnifierType::Subsumptive | UnifierType::Rule => {
            !parent.is_direct() || child.type_id() == parent.type_id()
        }
    };
    let compatible = direct_compatible
        && unifier_type.type_compatible(type_system, child.type_id(), parent.type_id())
        && unifier_type.id_compatible(child.id_of(child.var()), parent.id_of(parent.var()))
        && unifier_type
            .values_compatible(&child.values_of(child.var()), &parent.values_of(parent.var()));

    if !compatible {
        return MultiUnifier::non_existent();
    }

    let mut unifier = Unifier::from([(child.var().clone(), parent.var().clone())]);
    map_if_named(&mut unifier, child.type_var(), parent.type_var());

    finish([unifier])
}

impl AtomRef<'_, '_> {
    /// Computes the unifiers mapping the variables of this atom, the child, to the variables of
    /// `parent`.
    ///
    /// Fails when the two atoms are of kinds that can never unify. Relationships unify with
    /// relationships and resources, resources with resources, and every other atom only with an
    /// atom of its own kind.
    pub fn unify(
        &self,
        parent: &AtomRef<'_, '_>,
        unifier_type: UnifierType,
    ) -> ReasonerResult<MultiUnifier> {
        let child_type = self.atom_type();
        let parent_type = parent.atom_type();

        let incompatible = || ReasonerError::IncompatibleUnificationTargets {
            child: child_type,
            parent: parent_type,
        };

        let unifiers = match (child_type, parent_type) {
            (AtomType::Relationship, AtomType::Relationship)
            | (AtomType::Resource, AtomType::Resource)
            | (AtomType::Relationship, AtomType::Resource)
            | (AtomType::Resource, AtomType::Relationship)
                if AtomicEquivalence::Equality.equivalent(self, parent) =>
            {
                MultiUnifier::trivial()
            }
            (AtomType::Relationship, AtomType::Relationship) => {
                relation_unifiers(self, parent, unifier_type)
            }
            (AtomType::Resource, AtomType::Resource) => {
                resource_unifier(self, parent, unifier_type)
            }
            (AtomType::Resource, AtomType::Relationship) => {
                let converted = self.to_relationship_atom()?;

                relation_unifiers(&self.sibling(&converted), parent, unifier_type)
            }
            (AtomType::Relationship, AtomType::Resource) => {
                let converted = parent.to_relationship_atom()?;

                relation_unifiers(self, &parent.sibling(&converted), unifier_type)
            }
            (AtomType::Relationship | AtomType::Resource, _)
            | (_, AtomType::Relationship | AtomType::Resource) => return Err(incompatible()),
            _ if child_type != parent_type => return Err(incompatible()),
            _ if AtomicEquivalence::Equality.equivalent(self, parent) => MultiUnifier::trivial(),
            _ => binary_unifier(self, parent, unifier_type),
        };

        debug!(
            %child_type,
            count = unifiers.len(),
            ?unifier_type,
            "unified atoms"
        );

        Ok(unifiers)
    }
}
