//! The query owning atoms and predicates.

use std::{cell::OnceCell, fmt};

use tracing::debug;

use crate::{
    answer::Answer,
    atom::{Atom, AtomFactory, AtomKind, AtomRef, AtomType},
    error::{ReasonerError, ReasonerResult},
    id::{AtomId, ConceptId, IdGenerator, QueryId},
    pattern::{Conjunction, Property},
    predicate::{IdPredicate, ValuePredicate},
    schema::{self, TypeSystem},
    variable::Variable,
    FxIndexMap, FxIndexSet,
};

static QUERY_IDS: IdGenerator = IdGenerator::new();

/// A conjunctive query decomposed into atoms and predicates.
///
/// The query is the arena of its atoms. Every rewrite producing a new query gives it a fresh id,
/// and its atoms are re-homed under that id.
pub struct ReasonerQuery<'s> {
    id: QueryId,
    schema: &'s dyn TypeSystem,
    atoms: Vec<Atom>,
    id_predicates: Vec<IdPredicate>,
    value_predicates: Vec<ValuePredicate>,
    substitution: Answer,
    var_types: OnceCell<FxIndexMap<Variable, ConceptId>>,
}

impl fmt::Debug for ReasonerQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonerQuery")
            .field("id", &self.id)
            .field("atoms", &self.atoms)
            .field("id_predicates", &self.id_predicates)
            .field("value_predicates", &self.value_predicates)
            .field("substitution", &self.substitution)
            .finish_non_exhaustive()
    }
}

impl<'s> ReasonerQuery<'s> {
    pub fn new(schema: &'s dyn TypeSystem, conjunction: &Conjunction) -> ReasonerResult<Self> {
        Self::with_substitution(schema, conjunction, Answer::new())
    }

    /// Builds a query whose variables are partially bound by `substitution`. Bound variables get
    /// an id predicate each.
    pub fn with_substitution(
        schema: &'s dyn TypeSystem,
        conjunction: &Conjunction,
        substitution: Answer,
    ) -> ReasonerResult<Self> {
        let id = QueryId(QUERY_IDS.generate_id());

        let mut id_predicates = Vec::new();
        let mut value_predicates = Vec::new();

        for statement in &conjunction.statements {
            for property in &statement.properties {
                match property {
                    Property::Id(concept) => {
                        id_predicates.push(IdPredicate::new(statement.var.clone(), *concept));
                    }
                    Property::Type(label) => {
                        let concept = schema.resolve(label.as_str()).ok_or_else(|| {
                            ReasonerError::SchemaConceptNotFound {
                                label: label.clone(),
                            }
                        })?;

                        id_predicates.push(IdPredicate::new(statement.var.clone(), concept));
                    }
                    Property::Value(operation) => {
                        value_predicates
                            .push(ValuePredicate::new(statement.var.clone(), operation.clone()));
                    }
                    _ => {}
                }
            }
        }

        for (var, concept) in substitution.iter() {
            if !id_predicates.iter().any(|predicate| &predicate.var == var) {
                id_predicates.push(IdPredicate::new(var.clone(), concept.id()));
            }
        }

        let factory = AtomFactory {
            query: id,
            schema,
            id_predicates: &id_predicates,
            value_predicates: &value_predicates,
        };
        let mut atoms = Vec::new();

        for statement in &conjunction.statements {
            atoms.extend(factory.atoms(statement)?);
        }

        debug!(
            atoms = atoms.len(),
            id_predicates = id_predicates.len(),
            value_predicates = value_predicates.len(),
            "built query"
        );

        Ok(Self {
            id,
            schema,
            atoms,
            id_predicates,
            value_predicates,
            substitution,
            var_types: OnceCell::new(),
        })
    }

    fn from_parts(
        schema: &'s dyn TypeSystem,
        atoms: Vec<Atom>,
        id_predicates: Vec<IdPredicate>,
        value_predicates: Vec<ValuePredicate>,
        substitution: Answer,
    ) -> Self {
        let id = QueryId(QUERY_IDS.generate_id());

        Self {
            id,
            schema,
            atoms: atoms.iter().map(|atom| atom.with_query(id)).collect(),
            id_predicates,
            value_predicates,
            substitution,
            var_types: OnceCell::new(),
        }
    }

    /// A query made of copies of atoms from other queries, together with the predicates their
    /// variables carry there.
    pub fn from_atoms<'a>(
        schema: &'s dyn TypeSystem,
        atoms: impl IntoIterator<Item = AtomRef<'a, 's>>,
    ) -> Self
    where
        's: 'a,
    {
        let mut copied = Vec::new();
        let mut id_predicates = FxIndexSet::default();
        let mut value_predicates = FxIndexSet::default();

        for atom in atoms {
            for var in atom.var_names() {
                id_predicates.extend(atom.query().id_predicate(&var).cloned());
                value_predicates.extend(atom.query().value_predicates(&var).cloned());
            }

            copied.push(atom.atom().clone());
        }

        Self::from_parts(
            schema,
            copied,
            id_predicates.into_iter().collect(),
            value_predicates.into_iter().collect(),
            Answer::new(),
        )
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn schema(&self) -> &'s dyn TypeSystem {
        self.schema
    }

    pub fn substitution(&self) -> &Answer {
        &self.substitution
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomRef<'_, 's>> {
        self.atoms.iter().map(|atom| AtomRef::new(atom, self))
    }

    pub fn atom_ref(&self, atom: AtomId) -> Option<AtomRef<'_, 's>> {
        self.atoms.get(atom.0).map(|atom| AtomRef::new(atom, self))
    }

    /// Views an atom built from this query, such as the result of a rewrite.
    pub fn view<'a>(&'a self, atom: &'a Atom) -> AtomRef<'a, 's> {
        AtomRef::new(atom, self)
    }

    pub fn atoms_of_kind(&self, atom_type: AtomType) -> impl Iterator<Item = AtomRef<'_, 's>> {
        self.atoms()
            .filter(move |atom| atom.atom_type() == atom_type)
    }

    pub fn id_predicates(&self) -> &[IdPredicate] {
        &self.id_predicates
    }

    pub fn id_predicate(&self, var: &Variable) -> Option<&IdPredicate> {
        self.id_predicates
            .iter()
            .find(|predicate| &predicate.var == var)
    }

    pub fn all_value_predicates(&self) -> &[ValuePredicate] {
        &self.value_predicates
    }

    pub fn value_predicates<'a>(
        &'a self,
        var: &'a Variable,
    ) -> impl Iterator<Item = &'a ValuePredicate> + 'a {
        self.value_predicates
            .iter()
            .filter(move |predicate| &predicate.var == var)
    }

    /// Types assigned to variables by the atoms of this query.
    ///
    /// A variable typed by several atoms keeps the most specific of the types. Instances bound by
    /// the substitution contribute their types to variables no atom types.
    pub fn var_type_map(&self) -> &FxIndexMap<Variable, ConceptId> {
        self.var_types.get_or_init(|| {
            let mut var_types = FxIndexMap::default();

            for atom in &self.atoms {
                let typed_var = match atom.kind() {
                    AtomKind::Isa { .. } | AtomKind::Relationship { .. } => atom.var(),
                    AtomKind::Resource { attribute, .. } => attribute,
                    _ => continue,
                };

                if let Some(type_id) = atom.type_id() {
                    self.insert_most_specific(&mut var_types, typed_var, type_id);
                }
            }

            for (var, concept) in self.substitution.iter() {
                if let Some(type_id) = concept.thing_type() {
                    var_types.entry(var.clone()).or_insert(type_id);
                }
            }

            var_types
        })
    }

    fn insert_most_specific(
        &self,
        var_types: &mut FxIndexMap<Variable, ConceptId>,
        var: &Variable,
        type_id: ConceptId,
    ) {
        match var_types.get_mut(var) {
            Some(existing) => {
                if schema::is_subtype_or_equal(self.schema, type_id, *existing) {
                    *existing = type_id;
                }
            }
            None => {
                var_types.insert(var.clone(), type_id);
            }
        }
    }

    /// [`Self::var_type_map`] extended with the types of instances `answer` binds.
    pub fn var_type_map_with(&self, answer: &Answer) -> FxIndexMap<Variable, ConceptId> {
        let mut var_types = self.var_type_map().clone();

        for (var, concept) in answer.iter() {
            if let Some(type_id) = concept.thing_type() {
                var_types.entry(var.clone()).or_insert(type_id);
            }
        }

        var_types
    }

    /// A new query in which the atom at `atom` is replaced.
    pub fn with_atom_replaced(&self, atom: AtomId, replacement: Atom) -> ReasonerQuery<'s> {
        let atoms = self
            .atoms
            .iter()
            .enumerate()
            .map(|(index, existing)| {
                if index == atom.0 {
                    replacement.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();

        Self::from_parts(
            self.schema,
            atoms,
            self.id_predicates.clone(),
            self.value_predicates.clone(),
            self.substitution.clone(),
        )
    }

    /// A new query in which every relationship atom has its type and roles inferred.
    pub fn infer_types(&self) -> ReasonerQuery<'s> {
        let atoms = self
            .atoms()
            .map(|atom| match atom.atom_type() {
                AtomType::Relationship => atom.infer_types(&self.substitution),
                _ => atom.atom().clone(),
            })
            .collect();

        Self::from_parts(
            self.schema,
            atoms,
            self.id_predicates.clone(),
            self.value_predicates.clone(),
            self.substitution.clone(),
        )
    }

    /// The conjunction this query stands for.
    pub fn pattern(&self) -> Conjunction {
        let mut conjunction = Conjunction::default();

        for atom in self.atoms() {
            conjunction.extend(atom.combined_pattern());
        }

        conjunction
    }
}
