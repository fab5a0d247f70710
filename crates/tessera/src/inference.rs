//! Inference of relation types and role assignments missing from relationship atoms.
//!
//! Inference never fails. When the schema does not determine a type or a role, the atom is
//! returned with it left open, and [`AtomRef::atom_options`] lists the alternatives.

mod roles;

use std::cmp::Reverse;

use tracing::debug;

use crate::{
    answer::{Answer, Concept},
    atom::{Atom, AtomKind, AtomRef},
    id::ConceptId,
    schema::{self, TypeSystem},
    FxIndexMap, FxIndexSet,
};

/// Relation types, each with the roles through which it became compatible.
type RelationMultimap = FxIndexMap<ConceptId, FxIndexSet<ConceptId>>;

/// Keeps the relation types present in both maps, accumulating their roles.
fn multimap_intersection(a: &RelationMultimap, b: &RelationMultimap) -> RelationMultimap {
    a.iter()
        .filter_map(|(relation_type, roles)| {
            let other = b.get(relation_type)?;
            let roles = roles.iter().chain(other).copied().collect();

            Some((*relation_type, roles))
        })
        .collect()
}

/// Relation types compatible with every one of `concepts`.
fn compatible_relation_types(
    concepts: impl IntoIterator<Item = ConceptId>,
    to_multimap: impl Fn(ConceptId) -> RelationMultimap,
) -> RelationMultimap {
    concepts
        .into_iter()
        .map(to_multimap)
        .reduce(|compatible, next| multimap_intersection(&compatible, &next))
        .unwrap_or_default()
}

fn relation_types_with_role(type_system: &dyn TypeSystem, role: ConceptId) -> RelationMultimap {
    type_system
        .relation_types_with_role(role)
        .into_iter()
        .map(|relation_type| (relation_type, FxIndexSet::from_iter([role])))
        .collect()
}

fn relation_types_playable_by(type_system: &dyn TypeSystem, type_id: ConceptId) -> RelationMultimap {
    let mut multimap = RelationMultimap::default();

    for role in type_system.roles_playable_by(type_id) {
        for relation_type in type_system.relation_types_with_role(role) {
            multimap.entry(relation_type).or_default().insert(role);
        }
    }

    multimap
}

fn all_relation_types(type_system: &dyn TypeSystem) -> RelationMultimap {
    type_system
        .subtypes(type_system.meta().relation)
        .into_iter()
        .map(|relation_type| {
            let roles = type_system.roles_of(relation_type).into_iter().collect();

            (relation_type, roles)
        })
        .collect()
}

impl<'a, 's> AtomRef<'a, 's> {
    /// The schema concept `answer` binds the type variable to.
    fn answer_type(&self, answer: &Answer) -> Option<ConceptId> {
        self.type_var()
            .and_then(|var| answer.get(var))
            .and_then(Concept::schema_concept)
    }

    /// Types this atom can have, best candidate first.
    ///
    /// Relation types are ranked by whether their arity matches the number of role players, then
    /// by instance count, then non-implicit types first, then by the number of compatible roles.
    /// Of a candidate and its supertype, only the supertype is kept.
    pub fn infer_possible_types(&self, answer: &Answer) -> Vec<ConceptId> {
        if let Some(type_id) = self.type_id().or_else(|| self.answer_type(answer)) {
            return vec![type_id];
        }

        if !self.is_relationship() {
            return Vec::new();
        }

        if answer.is_empty() {
            return self
                .atom
                .cache
                .possible_types
                .get_or_init(|| self.compute_possible_relation_types(answer))
                .clone();
        }

        self.compute_possible_relation_types(answer)
    }

    fn compute_possible_relation_types(&self, answer: &Answer) -> Vec<ConceptId> {
        let type_system = self.schema();

        let roles = self.explicit_roles();
        let var_types = self.query().var_type_map_with(answer);
        let types = self
            .role_players()
            .iter()
            .filter_map(|player| var_types.get(player).copied())
            .filter(|&type_id| !schema::is_meta(type_system, type_id))
            .collect::<FxIndexSet<_>>();

        let from_roles = compatible_relation_types(roles.iter().copied(), |role| {
            relation_types_with_role(type_system, role)
        });
        let from_types = compatible_relation_types(types.iter().copied(), |type_id| {
            relation_types_playable_by(type_system, type_id)
        });

        let compatible = if roles.is_empty() && types.is_empty() {
            all_relation_types(type_system)
        } else if roles.is_empty() {
            from_types
        } else if from_roles.is_empty() || types.is_empty() {
            from_roles
        } else {
            multimap_intersection(&from_types, &from_roles)
        };

        let arity = self.castings().len();
        let mut candidates = compatible.iter().collect::<Vec<_>>();

        candidates.sort_by_key(|&(&relation_type, roles)| {
            (
                type_system.roles_of(relation_type).len() != arity,
                Reverse(type_system.approx_instance_count(relation_type)),
                type_system.is_implicit(relation_type),
                Reverse(roles.len()),
                type_system.label(relation_type).cloned(),
            )
        });

        let possible_types = candidates
            .into_iter()
            .map(|(&relation_type, _)| relation_type)
            .filter(|&relation_type| {
                type_system
                    .supertypes(relation_type)
                    .iter()
                    .all(|sup| !compatible.contains_key(sup))
            })
            .collect::<Vec<_>>();

        debug!(atom = %self, ?possible_types, "inferred possible relation types");

        possible_types
    }

    /// The atom with its type bound, when exactly one type is possible.
    fn infer_type(&self, answer: &Answer) -> Atom {
        if self.type_id().is_some() {
            return self.atom().clone();
        }

        match self.infer_possible_types(answer).as_slice() {
            [type_id] => self.add_type(*type_id),
            candidates => {
                debug!(
                    atom = %self,
                    candidates = candidates.len(),
                    "type left open"
                );

                self.atom().clone()
            }
        }
    }

    /// The atom with its type and, for relationships, its roles inferred as far as the schema
    /// allows.
    pub fn infer_types(&self, answer: &Answer) -> Atom {
        let typed = self.infer_type(answer);

        match typed.kind() {
            AtomKind::Relationship { .. } => self.sibling(&typed).infer_roles(answer),
            _ => typed,
        }
    }

    /// One atom per possible type, each with its roles inferred, ordered by the number of
    /// distinct roles they end up with.
    pub fn atom_options(&self, answer: &Answer) -> Vec<Atom> {
        if !self.is_relationship() {
            return vec![self.infer_types(answer)];
        }

        let type_system = self.schema();
        let mut options = self
            .infer_possible_types(answer)
            .into_iter()
            .map(|type_id| {
                let typed = self.add_type(type_id);

                self.sibling(&typed).infer_roles(answer)
            })
            .collect::<Vec<_>>();

        options.sort_by_key(|option| {
            Reverse(
                option
                    .role_labels()
                    .iter()
                    .filter(|&&role| !schema::is_meta_role(type_system, role))
                    .count(),
            )
        });

        options
    }
}
