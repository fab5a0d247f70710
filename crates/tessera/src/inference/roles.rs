use tracing::{debug, trace};

use crate::{
    answer::Answer,
    atom::{Atom, AtomKind, AtomRef, Casting},
    schema,
    FxIndexSet,
};

impl AtomRef<'_, '_> {
    /// Assigns roles to the role players lacking one.
    ///
    /// A player gets a role only when the schema leaves exactly one possibility for it: the roles
    /// of the relation type its own type may play, or every role of the relation type when its
    /// type is unknown. Any other player gets the meta role. Explicit roles and role variables are
    /// kept.
    pub fn infer_roles(&self, answer: &Answer) -> Atom {
        let AtomKind::Relationship { castings } = self.kind() else {
            return self.atom().clone();
        };

        let type_system = self.schema();
        let meta_role = type_system.meta().role;

        let var_types = self.query().var_type_map_with(answer);

        let is_meta = |casting: &Casting| casting.role == Some(meta_role);
        let all_roles_known = castings.iter().all(|casting| casting.role.is_some());
        let meta_recomputation_viable = castings.iter().all(is_meta)
            && (!answer.is_empty()
                || castings
                    .iter()
                    .any(|casting| var_types.contains_key(&casting.player)));

        if all_roles_known && !meta_recomputation_viable {
            return self.atom().clone();
        }

        let possible_roles = match self.type_id() {
            Some(relation_type) => type_system
                .roles_of(relation_type)
                .into_iter()
                .collect::<FxIndexSet<_>>(),
            None => self
                .infer_possible_types(answer)
                .into_iter()
                .flat_map(|relation_type| type_system.roles_of(relation_type))
                .collect(),
        };

        let castings = castings
            .iter()
            .map(|casting| {
                let explicit = casting.role_var.is_some()
                    || casting
                        .role
                        .is_some_and(|role| role != meta_role || !meta_recomputation_viable);

                if explicit {
                    return casting.clone();
                }

                let candidates = match var_types
                    .get(&casting.player)
                    .filter(|&&type_id| !schema::is_meta(type_system, type_id))
                {
                    Some(&type_id) => schema::top(
                        type_system,
                        schema::compatible_roles(type_system, type_id, &possible_roles),
                    ),
                    None => possible_roles.clone(),
                };

                let role = match (candidates.len(), candidates.first()) {
                    (1, Some(&role)) => role,
                    _ => meta_role,
                };

                trace!(
                    player = %casting.player,
                    candidates = candidates.len(),
                    ?role,
                    "assigned role"
                );

                Casting::new(Some(role), casting.player.clone())
            })
            .collect::<Vec<_>>();

        let inferred = self.with_kind(AtomKind::Relationship { castings });
        debug!(atom = %self.sibling(&inferred), "inferred roles");

        inferred
    }
}
