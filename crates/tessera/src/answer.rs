use crate::{id::ConceptId, predicate::Literal, variable::Variable, FxIndexMap};

/// A concept an answer binds a variable to.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Concept {
    /// A schema concept, a type or a role.
    Type(ConceptId),
    Thing {
        id: ConceptId,
        type_id: ConceptId,
    },
    Attribute {
        id: ConceptId,
        type_id: ConceptId,
        value: Literal,
    },
}

impl Concept {
    pub fn id(&self) -> ConceptId {
        match self {
            Concept::Type(id) | Concept::Thing { id, .. } | Concept::Attribute { id, .. } => *id,
        }
    }

    /// The type of an instance. Schema concepts have none.
    pub fn thing_type(&self) -> Option<ConceptId> {
        match self {
            Concept::Type(_) => None,
            Concept::Thing { type_id, .. } | Concept::Attribute { type_id, .. } => Some(*type_id),
        }
    }

    pub fn schema_concept(&self) -> Option<ConceptId> {
        match self {
            Concept::Type(id) => Some(*id),
            _ => None,
        }
    }
}

/// A (partial) substitution of query variables by concepts.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Answer {
    bindings: FxIndexMap<Variable, Concept>,
}

impl Answer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: Variable, concept: Concept) -> Option<Concept> {
        self.bindings.insert(var, concept)
    }

    pub fn get(&self, var: &Variable) -> Option<&Concept> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Concept)> {
        self.bindings.iter()
    }

    /// Merges two answers. Bindings of `other` win on conflict.
    pub fn merge(&self, other: &Answer) -> Answer {
        let mut merged = self.clone();
        merged.bindings.extend(
            other
                .bindings
                .iter()
                .map(|(var, concept)| (var.clone(), concept.clone())),
        );

        merged
    }
}

impl FromIterator<(Variable, Concept)> for Answer {
    fn from_iter<T: IntoIterator<Item = (Variable, Concept)>>(iter: T) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}
