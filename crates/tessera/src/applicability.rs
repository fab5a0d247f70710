//! A cheap test of whether a rule head can possibly unify with a query atom.
//!
//! The test over-approximates: it may accept heads that turn out not to unify, but never rejects
//! one that does. Loosening the query atom, by dropping a predicate or widening a type, never
//! turns an applicable head into an inapplicable one.

use tracing::trace;

use crate::{
    answer::Answer,
    atom::{AtomKind, AtomRef, AtomType},
    schema,
    unification::{relation_player_mappings, UnifierType},
};

const RULE: UnifierType = UnifierType::Rule;

impl AtomRef<'_, '_> {
    /// Whether a rule concluding `head` may produce answers to this atom.
    pub fn is_rule_applicable(&self, head: &AtomRef<'_, '_>) -> bool {
        let applicable = match self.atom_type() {
            AtomType::Relationship => self.is_relationship_head_applicable(head),
            AtomType::Resource => self.is_resource_head_applicable(head),
            AtomType::Isa => self.is_isa_head_applicable(head),
            AtomType::Sub | AtomType::Plays | AtomType::Relates | AtomType::Has => {
                head.atom_type() == self.atom_type()
                    && RULE.type_compatible(self.schema(), head.type_id(), self.type_id())
            }
        };

        if !applicable {
            trace!(atom = %self, head = %head, "rule head not applicable");
        }

        applicable
    }

    fn is_relationship_head_applicable(&self, head: &AtomRef<'_, '_>) -> bool {
        let converted;
        let head = match head.kind() {
            AtomKind::Relationship { .. } => *head,
            AtomKind::Resource { .. } => match head.to_relationship_atom() {
                Ok(atom) => {
                    converted = atom;
                    head.sibling(&converted)
                }
                Err(_) => return false,
            },
            _ => return false,
        };

        if head.castings().len() < self.castings().len() {
            return false;
        }

        // Roles are inferred on every path, so that dropping the relation type never makes the
        // query's roles more specific.
        let typed = match (self.type_id(), head.type_id()) {
            (Some(query_type), Some(head_type)) => {
                if !schema::is_subtype_or_equal(self.schema(), head_type, query_type) {
                    return false;
                }

                self.infer_roles(&Answer::new())
            }
            (None, Some(head_type)) => {
                let typed = self.add_type(head_type);

                self.sibling(&typed).infer_roles(&Answer::new())
            }
            _ => self.infer_roles(&Answer::new()),
        };

        !relation_player_mappings(&head, &self.sibling(&typed), RULE).is_empty()
    }

    fn is_resource_head_applicable(&self, head: &AtomRef<'_, '_>) -> bool {
        let converted;
        let head = match head.kind() {
            AtomKind::Resource { .. } => *head,
            AtomKind::Relationship { .. } => match head.to_resource_atom() {
                Ok(atom) => {
                    converted = atom;
                    head.sibling(&converted)
                }
                Err(_) => return false,
            },
            _ => return false,
        };
        let (Some(head_attribute), Some(attribute)) = (head.attribute(), self.attribute()) else {
            return false;
        };

        RULE.type_compatible(self.schema(), head.type_id(), self.type_id())
            && RULE.player_type_compatible(
                self.schema(),
                head.var_type(head.var()),
                self.var_type(self.var()),
            )
            && RULE.id_compatible(head.id_of(head.var()), self.id_of(self.var()))
            && RULE.id_compatible(head.id_of(head_attribute), self.id_of(attribute))
            && RULE.values_compatible(head.values(), self.values())
    }

    fn is_isa_head_applicable(&self, head: &AtomRef<'_, '_>) -> bool {
        let converted;
        let head = match head.kind() {
            AtomKind::Isa { .. } => *head,
            AtomKind::Relationship { .. } | AtomKind::Resource { .. } => match head.to_isa_atom() {
                Ok(atom) => {
                    converted = atom;
                    head.sibling(&converted)
                }
                Err(_) => return false,
            },
            _ => return false,
        };

        let direct_compatible = !self.is_direct()
            || head.type_id().is_none()
            || self.type_id().is_none()
            || head.type_id() == self.type_id();

        direct_compatible
            && RULE.type_compatible(self.schema(), head.type_id(), self.type_id())
            && RULE.id_compatible(head.id_of(head.var()), self.id_of(self.var()))
            && RULE.values_compatible(&head.values_of(head.var()), &self.values_of(self.var()))
    }
}
