use crate::{
    atom::{Atom, AtomKind, AtomRef, AtomType, Casting},
    error::{ReasonerError, ReasonerResult},
    predicate::ValueOperation,
    schema::ImplicitType,
    variable::Variable,
};

impl Atom {
    /// The attribute variable of a resource atom.
    pub fn attribute(&self) -> Option<&Variable> {
        match self.kind() {
            AtomKind::Resource { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    /// The variable naming the ownership edge of a resource atom.
    pub fn relation_var(&self) -> Option<&Variable> {
        match self.kind() {
            AtomKind::Resource { relation, .. } => relation.as_ref(),
            _ => None,
        }
    }

    /// Value operations a resource atom puts on its attribute.
    pub fn values(&self) -> &[ValueOperation] {
        match self.kind() {
            AtomKind::Resource { values, .. } => values,
            _ => &[],
        }
    }
}

impl AtomRef<'_, '_> {
    /// The relationship over the implicit `@has-<attribute>` relation type this resource atom
    /// stands for. The owner plays `@has-<attribute>-owner` and the attribute plays
    /// `@has-<attribute>-value`.
    pub fn to_relationship_atom(&self) -> ReasonerResult<Atom> {
        let AtomKind::Resource {
            attribute,
            relation,
            ..
        } = self.kind()
        else {
            return Err(ReasonerError::IllegalAtomConversion {
                from: self.atom_type(),
                to: AtomType::Relationship,
                reason: "only resource atoms convert into implicit relationships",
            });
        };

        let attribute_type = self
            .type_id()
            .ok_or(ReasonerError::IllegalAtomConversion {
                from: AtomType::Resource,
                to: AtomType::Relationship,
                reason: "the attribute type is not bound",
            })?;
        let attribute_label = self
            .schema()
            .label(attribute_type)
            .ok_or(ReasonerError::ConceptNotFound { id: attribute_type })?;

        let [relation_type, owner_role, value_role] = [
            ImplicitType::Has,
            ImplicitType::HasOwner,
            ImplicitType::HasValue,
        ]
        .map(|implicit| {
            let label = implicit.label(attribute_label);

            self.schema()
                .resolve(label.as_str())
                .ok_or(ReasonerError::SchemaConceptNotFound { label })
        });

        let castings = vec![
            Casting::new(Some(owner_role?), self.var().clone()),
            Casting::new(Some(value_role?), attribute.clone()),
        ];

        Ok(Atom::new(
            self.query.id(),
            relation.clone().unwrap_or_else(Variable::anonymous),
            None,
            Some(relation_type?),
            AtomKind::Relationship { castings },
        ))
    }
}
