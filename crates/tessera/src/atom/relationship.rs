use crate::{
    answer::Answer,
    atom::{Atom, AtomKind, AtomRef, AtomType, Casting},
    error::{ReasonerError, ReasonerResult},
    id::ConceptId,
    label::Label,
    schema::{self, ImplicitType},
    variable::Variable,
    FxIndexMap, FxIndexSet,
};

impl Atom {
    /// The same atom with its type bound to `type_id`.
    pub fn add_type(&self, type_id: ConceptId) -> Atom {
        self.with_type(self.type_var().cloned(), Some(type_id))
    }

    /// Names the type variable, so that unifiers map it.
    pub fn rewrite_with_type_variable(&self) -> Atom {
        let type_var = match self.type_var() {
            Some(var) => var.as_user_defined(),
            None => Variable::anonymous().as_user_defined(),
        };

        self.with_type(Some(type_var), self.type_id())
    }

    /// Names the variable standing for the relation instance. For resources that is the
    /// ownership edge.
    pub fn rewrite_with_relation_variable(&self) -> Atom {
        match self.kind() {
            AtomKind::Resource {
                attribute,
                relation,
                values,
            } => self.with_kind(AtomKind::Resource {
                attribute: attribute.clone(),
                relation: Some(match relation {
                    Some(relation) => relation.as_user_defined(),
                    None => Variable::anonymous().as_user_defined(),
                }),
                values: values.clone(),
            }),
            _ => self.with_var(self.var().as_user_defined()),
        }
    }

    /// Gives every casting a named role variable.
    pub fn rewrite_with_role_variables(&self) -> Atom {
        let AtomKind::Relationship { castings } = self.kind() else {
            return self.clone();
        };

        let castings = castings
            .iter()
            .map(|casting| Casting {
                role_var: Some(match &casting.role_var {
                    Some(var) => var.as_user_defined(),
                    None => Variable::anonymous().as_user_defined(),
                }),
                role: casting.role,
                player: casting.player.clone(),
            })
            .collect();

        self.with_kind(AtomKind::Relationship { castings })
    }

    /// Names every variable of this atom that `parent` names, so that unifiers against `parent`
    /// map them.
    pub fn rewrite_to_user_defined(&self, parent: &Atom) -> Atom {
        let mut atom = self.clone();

        let parent_names_relation = match parent.kind() {
            AtomKind::Resource { relation, .. } => {
                relation.as_ref().is_some_and(Variable::is_user_defined)
            }
            _ => parent.var().is_user_defined(),
        };

        if parent_names_relation {
            atom = atom.rewrite_with_relation_variable();
        }

        if parent.type_var().is_some_and(Variable::is_user_defined) {
            atom = atom.rewrite_with_type_variable();
        }

        if parent
            .castings()
            .iter()
            .any(Casting::has_user_defined_role_var)
        {
            atom = atom.rewrite_with_role_variables();
        }

        atom
    }

    /// Distinct role players, in casting order.
    pub fn role_players(&self) -> Vec<Variable> {
        self.castings()
            .iter()
            .map(|casting| casting.player.clone())
            .collect::<FxIndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Named role variables.
    pub fn role_variables(&self) -> Vec<Variable> {
        self.castings()
            .iter()
            .filter_map(|casting| casting.role_var.clone())
            .filter(Variable::is_user_defined)
            .collect()
    }

    /// Distinct roles the castings are known to play.
    pub fn role_labels(&self) -> FxIndexSet<ConceptId> {
        self.castings()
            .iter()
            .filter_map(|casting| casting.role)
            .collect()
    }
}

impl<'a, 's> AtomRef<'a, 's> {
    /// Players of each known role, in casting order.
    pub fn role_var_map(&self) -> &'a FxIndexMap<ConceptId, Vec<Variable>> {
        let atom = self.atom;

        atom.cache.role_player_map.get_or_init(|| {
            let mut map = FxIndexMap::<_, Vec<_>>::default();

            for casting in atom.castings() {
                if let Some(role) = casting.role {
                    map.entry(role).or_default().push(casting.player.clone());
                }
            }

            map
        })
    }

    /// Types of the players of each known role, for players whose type is known.
    pub fn role_type_map(&self, answer: &Answer) -> FxIndexMap<ConceptId, Vec<ConceptId>> {
        let var_types = self.query.var_type_map_with(answer);
        let mut map = FxIndexMap::<_, Vec<_>>::default();

        for (role, players) in self.role_var_map() {
            for player in players {
                if let Some(&type_id) = var_types.get(player) {
                    map.entry(*role).or_default().push(type_id);
                }
            }
        }

        map
    }

    /// Explicit roles other than the meta role.
    pub fn explicit_roles(&self) -> FxIndexSet<ConceptId> {
        self.role_labels()
            .into_iter()
            .filter(|&role| !schema::is_meta_role(self.schema(), role))
            .collect()
    }

    /// Named role variables whose role is not pinned down, and that answers must therefore expand.
    pub fn role_expansion_variables(&self) -> Vec<Variable> {
        self.castings()
            .iter()
            .filter(|casting| casting.has_user_defined_role_var())
            .filter(|casting| {
                casting
                    .role
                    .map_or(true, |role| schema::is_meta_role(self.schema(), role))
            })
            .filter_map(|casting| casting.role_var.clone())
            .collect()
    }

    pub fn requires_role_expansion(&self) -> bool {
        !self.role_expansion_variables().is_empty()
    }

    /// Whether answers to the atom must be persisted before they can be returned, because they
    /// bind a relation or attribute instance the answer refers to.
    pub fn requires_materialisation(&self) -> bool {
        match self.kind() {
            AtomKind::Relationship { .. } => {
                self.var().is_user_defined()
                    || self
                        .type_id()
                        .is_some_and(|type_id| self.schema().is_implicit(type_id))
            }
            AtomKind::Resource {
                attribute,
                relation,
                ..
            } => {
                !attribute.is_user_defined()
                    || relation.as_ref().is_some_and(Variable::is_user_defined)
            }
            _ => false,
        }
    }

    pub fn to_isa_atom(&self) -> ReasonerResult<Atom> {
        match self.kind() {
            AtomKind::Relationship { .. } => Ok(Atom::new(
                self.query.id(),
                self.var().clone(),
                self.type_var().cloned(),
                self.type_id(),
                AtomKind::Isa { direct: false },
            )),
            AtomKind::Resource { attribute, .. } => Ok(Atom::new(
                self.query.id(),
                attribute.clone(),
                None,
                self.type_id(),
                AtomKind::Isa { direct: false },
            )),
            _ => Err(ReasonerError::IllegalAtomConversion {
                from: self.atom_type(),
                to: AtomType::Isa,
                reason: "only relationship and resource atoms have an isa counterpart",
            }),
        }
    }

    /// Converts a relationship over an implicit attribute ownership type back into the resource
    /// atom it stands for.
    pub fn to_resource_atom(&self) -> ReasonerResult<Atom> {
        let illegal = |reason| ReasonerError::IllegalAtomConversion {
            from: self.atom_type(),
            to: AtomType::Resource,
            reason,
        };

        let AtomKind::Relationship { castings } = self.kind() else {
            return Err(illegal("only relationship atoms convert into resource atoms"));
        };
        let type_id = self
            .type_id()
            .ok_or_else(|| illegal("the relation type is not bound"))?;
        let label = self
            .schema()
            .label(type_id)
            .ok_or(ReasonerError::ConceptNotFound { id: type_id })?;
        let attribute_label = ImplicitType::attribute_label(label)
            .ok_or_else(|| illegal("the relation type is not an implicit ownership type"))?;

        let resolve = |label: Label| {
            self.schema()
                .resolve(label.as_str())
                .ok_or(ReasonerError::SchemaConceptNotFound { label })
        };
        let attribute_type = resolve(attribute_label.clone())?;
        let owner_role = resolve(ImplicitType::HasOwner.label(&attribute_label))?;
        let value_role = resolve(ImplicitType::HasValue.label(&attribute_label))?;

        let player_of = |role| {
            castings
                .iter()
                .find(|casting| casting.role == Some(role))
                .map(|casting| casting.player.clone())
        };
        let (Some(owner), Some(attribute), 2) =
            (player_of(owner_role), player_of(value_role), castings.len())
        else {
            return Err(illegal("the relationship does not have exactly an owner and a value"));
        };

        let relation = self.var().is_user_defined().then(|| self.var().clone());
        let values = self.values_of(&attribute);

        Ok(Atom::new(
            self.query.id(),
            owner,
            None,
            Some(attribute_type),
            AtomKind::Resource {
                attribute,
                relation,
                values,
            },
        ))
    }
}
