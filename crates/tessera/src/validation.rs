//! Checks of atoms appearing in rules. Every problem found is reported as a message, so that a
//! rule author sees all of them at once.

use std::collections::BTreeSet;

use crate::{
    atom::{AtomKind, AtomRef},
    id::ConceptId,
    predicate::Comparator,
    query::ReasonerQuery,
    schema::{self, ConceptKind, ImplicitType, TypeSystem},
};

fn describe(type_system: &dyn TypeSystem, concept: ConceptId) -> String {
    match type_system.label(concept) {
        Some(label) => label.to_string(),
        None => concept.to_string(),
    }
}

impl AtomRef<'_, '_> {
    /// Problems preventing this atom from being the head of a rule with the given body.
    pub fn validate_as_rule_head(&self, body: &ReasonerQuery<'_>) -> BTreeSet<String> {
        let type_system = self.schema();
        let mut errors = BTreeSet::new();

        match self.kind() {
            AtomKind::Relationship { castings } => {
                match self.type_id() {
                    None => {
                        errors.insert(format!(
                            "rule head `{self}` does not specify its relation type"
                        ));
                    }
                    Some(relation_type) if type_system.is_implicit(relation_type) => {
                        errors.insert(format!(
                            "rule head `{self}` uses the implicit relation type `{}`",
                            describe(type_system, relation_type)
                        ));
                    }
                    Some(_) => {}
                }

                for casting in castings {
                    match casting.role {
                        None => {
                            errors.insert(format!(
                                "role player {} of rule head `{self}` has no explicit role",
                                casting.player
                            ));
                        }
                        Some(role) if schema::is_meta_role(type_system, role) => {
                            errors.insert(format!(
                                "role player {} of rule head `{self}` has the ambiguous role `{}`",
                                casting.player,
                                describe(type_system, role)
                            ));
                        }
                        Some(role) if type_system.is_implicit(role) => {
                            errors.insert(format!(
                                "rule head `{self}` uses the implicit role `{}`",
                                describe(type_system, role)
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
            AtomKind::Resource {
                attribute, values, ..
            } => {
                if self.type_id().is_none() {
                    errors.insert(format!(
                        "rule head `{self}` does not specify its attribute type"
                    ));
                }

                match values.as_slice() {
                    [] => {
                        let bound_in_body = body
                            .atoms()
                            .any(|atom| atom.var_names().contains(attribute));

                        if !bound_in_body {
                            errors.insert(format!(
                                "attribute {attribute} of rule head `{self}` is neither given a value nor bound in the body"
                            ));
                        }
                    }
                    [value] if value.comparator != Comparator::Eq => {
                        errors.insert(format!(
                            "rule head `{self}` constrains its attribute with `{value}` instead of assigning a value"
                        ));
                    }
                    [_] => {}
                    _ => {
                        errors.insert(format!(
                            "rule head `{self}` assigns {} values to its attribute",
                            values.len()
                        ));
                    }
                }
            }
            AtomKind::Isa { .. } => match self.type_id() {
                None => {
                    errors.insert(format!("rule head `{self}` does not specify its type"));
                }
                Some(type_id) if schema::is_meta(type_system, type_id) => {
                    errors.insert(format!(
                        "rule head `{self}` uses the meta type `{}`",
                        describe(type_system, type_id)
                    ));
                }
                Some(_) => {}
            },
            AtomKind::Sub | AtomKind::Plays | AtomKind::Relates | AtomKind::Has => {
                errors.insert(format!(
                    "schema atom `{self}` cannot be the head of a rule"
                ));
            }
        }

        errors
    }

    /// Problems with this atom's use of the schema, wherever in a rule it appears.
    pub fn validate_in_rule(&self) -> BTreeSet<String> {
        let type_system = self.schema();
        let mut errors = BTreeSet::new();

        match self.kind() {
            AtomKind::Relationship { castings } => {
                let relation_type = self.type_id();

                if let Some(relation_type) = relation_type {
                    if type_system.kind(relation_type) != Some(ConceptKind::RelationType) {
                        errors.insert(format!(
                            "`{}` in `{self}` is not a relation type",
                            describe(type_system, relation_type)
                        ));

                        return errors;
                    }
                }

                let related = relation_type
                    .map(|relation_type| type_system.roles_of(relation_type))
                    .unwrap_or_default();

                for casting in castings {
                    let Some(role) = casting
                        .role
                        .filter(|&role| !schema::is_meta_role(type_system, role))
                    else {
                        continue;
                    };

                    if let Some(relation_type) = relation_type {
                        if !related.contains(&role) {
                            errors.insert(format!(
                                "relation type `{}` does not relate the role `{}`",
                                describe(type_system, relation_type),
                                describe(type_system, role)
                            ));
                        }
                    }

                    if let Some(player_type) = self.var_type(&casting.player) {
                        if !schema::is_meta(type_system, player_type)
                            && !type_system.roles_playable_by(player_type).contains(&role)
                        {
                            errors.insert(format!(
                                "type `{}` cannot play the role `{}`",
                                describe(type_system, player_type),
                                describe(type_system, role)
                            ));
                        }
                    }
                }
            }
            AtomKind::Resource { .. } => {
                let Some(attribute_type) = self.type_id() else {
                    return errors;
                };

                if type_system.kind(attribute_type) != Some(ConceptKind::AttributeType) {
                    errors.insert(format!(
                        "`{}` in `{self}` is not an attribute type",
                        describe(type_system, attribute_type)
                    ));

                    return errors;
                }

                let Some(owner_type) = self
                    .var_type(self.var())
                    .filter(|&owner_type| !schema::is_meta(type_system, owner_type))
                else {
                    return errors;
                };
                let owner_role = type_system.label(attribute_type).and_then(|label| {
                    type_system.resolve(ImplicitType::HasOwner.label(label).as_str())
                });
                let can_own = owner_role
                    .is_some_and(|role| type_system.roles_playable_by(owner_type).contains(&role));

                if !can_own {
                    errors.insert(format!(
                        "type `{}` cannot have the attribute `{}`",
                        describe(type_system, owner_type),
                        describe(type_system, attribute_type)
                    ));
                }
            }
            _ => {}
        }

        errors
    }
}
