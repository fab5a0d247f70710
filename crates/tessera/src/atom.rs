//! Atoms, the elementary fragments a conjunctive query is decomposed into.
//!
//! Atoms live in the arena of the [`ReasonerQuery`] that built them and record only its
//! [`QueryId`]. Anything needing the surrounding query (the types other atoms assign to variables,
//! predicates on variables) goes through an [`AtomRef`], which pairs an atom with its query.

mod relationship;
mod resource;

use std::{cell::OnceCell, fmt, ops::Deref};

use either::Either;
use tracing::trace;

use crate::{
    error::{ReasonerError, ReasonerResult},
    id::{ConceptId, QueryId},
    label::Label,
    pattern::{Conjunction, Property, RolePlayer, Statement, TypeRef},
    predicate::{IdPredicate, ValueOperation, ValuePredicate},
    query::ReasonerQuery,
    schema::{self, TypeSystem},
    variable::Variable,
    FxIndexMap, FxIndexSet,
};

/// The kind of an atom, without its payload.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum AtomType {
    /// `$x isa T`
    Isa,
    /// `$x sub T`
    Sub,
    /// `$x plays R`
    Plays,
    /// `$x relates R`
    Relates,
    /// `$x has T`, on a type
    Has,
    /// `(r: $x, ...) isa T`
    Relationship,
    /// `$x has T $a`, on an instance
    Resource,
}

impl AtomType {
    /// Whether the atom asserts an edge of the schema graph rather than a fact about instances.
    pub fn is_ontological(self) -> bool {
        matches!(
            self,
            AtomType::Sub | AtomType::Plays | AtomType::Relates | AtomType::Has
        )
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AtomType::Isa => "isa",
            AtomType::Sub => "sub",
            AtomType::Plays => "plays",
            AtomType::Relates => "relates",
            AtomType::Has => "has",
            AtomType::Relationship => "relationship",
            AtomType::Resource => "resource",
        })
    }
}

/// A role player of a relationship atom.
///
/// The role is known either from an explicit label or from an id predicate on the role
/// variable. A casting with neither leaves the role to be inferred.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Casting {
    /// Variable standing for the role, if the role is written as one.
    pub role_var: Option<Variable>,
    pub role: Option<ConceptId>,
    pub player: Variable,
}

impl Casting {
    pub fn new(role: Option<ConceptId>, player: Variable) -> Self {
        Self {
            role_var: None,
            role,
            player,
        }
    }

    pub fn has_user_defined_role_var(&self) -> bool {
        self.role_var
            .as_ref()
            .is_some_and(Variable::is_user_defined)
    }
}

#[derive(Clone, Debug)]
pub enum AtomKind {
    /// `var isa type`. A direct isa does not match instances of subtypes.
    Isa { direct: bool },
    Sub,
    Plays,
    Relates,
    Has,
    Relationship { castings: Vec<Casting> },
    /// `var has type attribute`, optionally naming the ownership edge.
    Resource {
        attribute: Variable,
        relation: Option<Variable>,
        values: Vec<ValueOperation>,
    },
}

impl AtomKind {
    pub fn atom_type(&self) -> AtomType {
        match self {
            AtomKind::Isa { .. } => AtomType::Isa,
            AtomKind::Sub => AtomType::Sub,
            AtomKind::Plays => AtomType::Plays,
            AtomKind::Relates => AtomType::Relates,
            AtomKind::Has => AtomType::Has,
            AtomKind::Relationship { .. } => AtomType::Relationship,
            AtomKind::Resource { .. } => AtomType::Resource,
        }
    }
}

impl PartialEq for AtomKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AtomKind::Isa { direct: a }, AtomKind::Isa { direct: b }) => a == b,
            (AtomKind::Relationship { castings: a }, AtomKind::Relationship { castings: b }) => {
                let mut a = a.iter().collect::<Vec<_>>();
                let mut b = b.iter().collect::<Vec<_>>();

                a.sort();
                b.sort();

                a == b
            }
            (
                AtomKind::Resource {
                    attribute: a_attribute,
                    relation: a_relation,
                    values: a_values,
                },
                AtomKind::Resource {
                    attribute: b_attribute,
                    relation: b_relation,
                    values: b_values,
                },
            ) => a_attribute == b_attribute && a_relation == b_relation && a_values == b_values,
            _ => self.atom_type() == other.atom_type(),
        }
    }
}

/// Derived data computed on first use. Cloning an atom starts over with an empty cache, since the
/// clone may end up under a different query.
#[derive(Default)]
pub(crate) struct AtomCache {
    pub(crate) hashes: [OnceCell<u64>; 3],
    pub(crate) role_player_map: OnceCell<FxIndexMap<ConceptId, Vec<Variable>>>,
    pub(crate) possible_types: OnceCell<Vec<ConceptId>>,
}

impl Clone for AtomCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for AtomCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomCache").finish_non_exhaustive()
    }
}

/// An immutable atom. Rewrites return new atoms.
#[derive(Clone, Debug)]
pub struct Atom {
    pub(crate) query: QueryId,
    var: Variable,
    type_var: Option<Variable>,
    type_id: Option<ConceptId>,
    kind: AtomKind,
    pub(crate) cache: AtomCache,
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.var == other.var
            && self.type_var == other.type_var
            && self.type_id == other.type_id
            && self.kind == other.kind
    }
}

impl Atom {
    pub(crate) fn new(
        query: QueryId,
        var: Variable,
        type_var: Option<Variable>,
        type_id: Option<ConceptId>,
        kind: AtomKind,
    ) -> Self {
        Self {
            query,
            var,
            type_var,
            type_id,
            kind,
            cache: AtomCache::default(),
        }
    }

    pub fn var(&self) -> &Variable {
        &self.var
    }

    /// The variable standing for the atom's type, or for the other end of an ontological atom.
    pub fn type_var(&self) -> Option<&Variable> {
        self.type_var.as_ref()
    }

    pub fn type_id(&self) -> Option<ConceptId> {
        self.type_id
    }

    pub fn kind(&self) -> &AtomKind {
        &self.kind
    }

    pub fn atom_type(&self) -> AtomType {
        self.kind.atom_type()
    }

    pub fn query_id(&self) -> QueryId {
        self.query
    }

    /// Castings of a relationship atom. Other atoms have none.
    pub fn castings(&self) -> &[Casting] {
        match &self.kind {
            AtomKind::Relationship { castings } => castings,
            _ => &[],
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.kind, AtomKind::Relationship { .. })
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, AtomKind::Resource { .. })
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.kind, AtomKind::Isa { direct: true })
    }

    pub(crate) fn with_query(&self, query: QueryId) -> Atom {
        let mut atom = self.clone();
        atom.query = query;

        atom
    }

    pub(crate) fn with_type(&self, type_var: Option<Variable>, type_id: Option<ConceptId>) -> Atom {
        Atom::new(self.query, self.var.clone(), type_var, type_id, self.kind.clone())
    }

    pub(crate) fn with_var(&self, var: Variable) -> Atom {
        Atom::new(
            self.query,
            var,
            self.type_var.clone(),
            self.type_id,
            self.kind.clone(),
        )
    }

    pub(crate) fn with_kind(&self, kind: AtomKind) -> Atom {
        Atom::new(
            self.query,
            self.var.clone(),
            self.type_var.clone(),
            self.type_id,
            kind,
        )
    }
}

/// Builds the atoms of one statement against a query under construction.
pub(crate) struct AtomFactory<'q, 's> {
    pub(crate) query: QueryId,
    pub(crate) schema: &'s dyn TypeSystem,
    pub(crate) id_predicates: &'q [IdPredicate],
    pub(crate) value_predicates: &'q [ValuePredicate],
}

impl AtomFactory<'_, '_> {
    fn resolve(&self, label: &Label) -> ReasonerResult<ConceptId> {
        self.schema
            .resolve(label.as_str())
            .ok_or_else(|| ReasonerError::SchemaConceptNotFound {
                label: label.clone(),
            })
    }

    /// The schema concept an id predicate binds `var` to.
    fn bound_schema_concept(&self, var: &Variable) -> ReasonerResult<Option<ConceptId>> {
        let Some(predicate) = self.id_predicates.iter().find(|predicate| &predicate.var == var)
        else {
            return Ok(None);
        };

        match self.schema.kind(predicate.id) {
            Some(_) => Ok(Some(predicate.id)),
            None => Err(ReasonerError::ConceptNotFound { id: predicate.id }),
        }
    }

    fn binding(&self, type_ref: &TypeRef) -> ReasonerResult<(Option<Variable>, Option<ConceptId>)> {
        match type_ref {
            TypeRef::Label(label) => Ok((None, Some(self.resolve(label)?))),
            TypeRef::Var(var) => Ok((Some(var.clone()), self.bound_schema_concept(var)?)),
        }
    }

    fn values_of(&self, var: &Variable) -> Vec<ValueOperation> {
        let mut values = self
            .value_predicates
            .iter()
            .filter(|predicate| &predicate.var == var)
            .map(|predicate| predicate.operation.clone())
            .collect::<Vec<_>>();

        values.sort();
        values
    }

    fn casting(&self, role_player: &RolePlayer) -> ReasonerResult<Casting> {
        let (role_var, role) = match &role_player.role {
            Some(role) => self.binding(role)?,
            None => (None, None),
        };

        Ok(Casting {
            role_var,
            role,
            player: role_player.player.clone(),
        })
    }

    pub(crate) fn atoms(&self, statement: &Statement) -> ReasonerResult<Vec<Atom>> {
        let var = &statement.var;
        let mut atoms = Vec::new();

        let isa = statement.properties.iter().find_map(|property| match property {
            Property::Isa { type_ref, direct } => Some((type_ref, *direct)),
            _ => None,
        });
        let relation = statement.properties.iter().find_map(|property| match property {
            Property::Relation(role_players) => Some(role_players),
            _ => None,
        });

        if let Some(role_players) = relation {
            let (type_var, type_id) = match isa {
                Some((type_ref, _)) => self.binding(type_ref)?,
                None => (None, None),
            };
            let castings = role_players
                .iter()
                .map(|role_player| self.casting(role_player))
                .collect::<ReasonerResult<Vec<_>>>()?;

            atoms.push(Atom::new(
                self.query,
                var.clone(),
                type_var,
                type_id,
                AtomKind::Relationship { castings },
            ));
        } else if let Some((type_ref, direct)) = isa {
            let (type_var, type_id) = self.binding(type_ref)?;

            atoms.push(Atom::new(
                self.query,
                var.clone(),
                type_var,
                type_id,
                AtomKind::Isa { direct },
            ));
        }

        for property in &statement.properties {
            let (type_ref, kind) = match property {
                Property::Sub(type_ref) => (type_ref, AtomKind::Sub),
                Property::Plays(type_ref) => (type_ref, AtomKind::Plays),
                Property::Relates(type_ref) => (type_ref, AtomKind::Relates),
                Property::HasType(type_ref) => (type_ref, AtomKind::Has),
                Property::Has {
                    attribute_type,
                    attribute,
                    relation,
                } => {
                    let type_id = self.resolve(attribute_type)?;

                    atoms.push(Atom::new(
                        self.query,
                        var.clone(),
                        None,
                        Some(type_id),
                        AtomKind::Resource {
                            attribute: attribute.clone(),
                            relation: relation.clone(),
                            values: self.values_of(attribute),
                        },
                    ));

                    continue;
                }
                _ => continue,
            };
            let (type_var, type_id) = self.binding(type_ref)?;

            atoms.push(Atom::new(self.query, var.clone(), type_var, type_id, kind));
        }

        if atoms.is_empty() && statement.properties.iter().all(Property::is_atomic) {
            return Err(ReasonerError::UnsupportedStatement { var: var.clone() });
        }

        trace!(%var, count = atoms.len(), "built atoms for statement");

        Ok(atoms)
    }
}

/// An atom together with the query owning it.
#[derive(Clone, Copy)]
pub struct AtomRef<'a, 's> {
    pub(crate) atom: &'a Atom,
    pub(crate) query: &'a ReasonerQuery<'s>,
}

impl<'a, 's> Deref for AtomRef<'a, 's> {
    type Target = Atom;

    fn deref(&self) -> &Self::Target {
        self.atom
    }
}

impl fmt::Debug for AtomRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.atom, f)
    }
}

impl<'a, 's> AtomRef<'a, 's> {
    pub(crate) fn new(atom: &'a Atom, query: &'a ReasonerQuery<'s>) -> Self {
        debug_assert_eq!(
            atom.query,
            query.id(),
            "atom viewed through a query that does not own it"
        );

        Self { atom, query }
    }

    pub fn atom(&self) -> &'a Atom {
        self.atom
    }

    pub fn query(&self) -> &'a ReasonerQuery<'s> {
        self.query
    }

    pub fn schema(&self) -> &'s dyn TypeSystem {
        self.query.schema()
    }

    /// Views another atom of the same query.
    pub fn sibling<'b>(&self, atom: &'b Atom) -> AtomRef<'b, 's>
    where
        'a: 'b,
    {
        AtomRef::new(atom, self.query)
    }

    /// Duplicates the atom under another query.
    pub fn copy(&self, parent: &ReasonerQuery<'_>) -> Atom {
        self.atom.with_query(parent.id())
    }

    /// Every variable the atom mentions.
    pub fn var_names(&self) -> Vec<Variable> {
        let mut vars = vec![self.var.clone()];
        vars.extend(self.type_var.clone());

        match &self.kind {
            AtomKind::Relationship { castings } => {
                for casting in castings {
                    vars.extend(casting.role_var.clone());
                    vars.push(casting.player.clone());
                }
            }
            AtomKind::Resource {
                attribute,
                relation,
                ..
            } => {
                vars.push(attribute.clone());
                vars.extend(relation.clone());
            }
            _ => {}
        }

        let mut seen = FxIndexSet::default();
        vars.retain(|var| seen.insert(var.clone()));

        vars
    }

    /// The type an atom of this query gives `var`, if any.
    pub(crate) fn var_type(&self, var: &Variable) -> Option<ConceptId> {
        self.query.var_type_map().get(var).copied()
    }

    pub(crate) fn id_of(&self, var: &Variable) -> Option<ConceptId> {
        self.query.id_predicate(var).map(|predicate| predicate.id)
    }

    /// Value operations constraining `var`. Resource atoms carry their own.
    pub(crate) fn values_of(&self, var: &Variable) -> Vec<ValueOperation> {
        let values = match &self.kind {
            AtomKind::Resource {
                attribute, values, ..
            } if attribute == var => Either::Left(values.iter().cloned()),
            _ => Either::Right(
                self.query
                    .value_predicates(var)
                    .map(|predicate| predicate.operation.clone()),
            ),
        };

        let mut values = values.collect::<Vec<_>>();
        values.sort();

        values
    }

    fn binding_statement(&self, var: &Variable, id: ConceptId) -> Statement {
        let property = match self.schema().label(id) {
            Some(label) => Property::Type(label.clone()),
            None => Property::Id(id),
        };

        Statement::new(var.clone(), vec![property])
    }

    /// Renders a type or role binding, pushing the statements binding a variable to `extra`.
    fn schema_ref(
        &self,
        var: Option<&Variable>,
        id: Option<ConceptId>,
        extra: &mut Vec<Statement>,
    ) -> Option<TypeRef> {
        match (var, id) {
            (Some(var), id) if var.is_user_defined() || id.is_none() => {
                if let Some(id) = id {
                    extra.push(self.binding_statement(var, id));
                }

                Some(TypeRef::Var(var.clone()))
            }
            (var, Some(id)) => match self.schema().label(id) {
                Some(label) => Some(TypeRef::Label(label.clone())),
                None => {
                    let var = var.cloned().unwrap_or_else(Variable::anonymous);
                    extra.push(self.binding_statement(&var, id));

                    Some(TypeRef::Var(var))
                }
            },
            (_, None) => None,
        }
    }

    fn statement(&self, extra: &mut Vec<Statement>) -> Statement {
        let type_ref = self.schema_ref(self.type_var.as_ref(), self.type_id, extra);
        let fallback = || TypeRef::Label(Label::new(schema::THING));

        let properties = match &self.kind {
            AtomKind::Isa { direct } => vec![Property::Isa {
                type_ref: type_ref.unwrap_or_else(fallback),
                direct: *direct,
            }],
            AtomKind::Sub => vec![Property::Sub(type_ref.unwrap_or_else(fallback))],
            AtomKind::Plays => vec![Property::Plays(type_ref.unwrap_or_else(fallback))],
            AtomKind::Relates => vec![Property::Relates(type_ref.unwrap_or_else(fallback))],
            AtomKind::Has => vec![Property::HasType(type_ref.unwrap_or_else(fallback))],
            AtomKind::Relationship { castings } => {
                let role_players = castings
                    .iter()
                    .map(|casting| {
                        let role = self.schema_ref(casting.role_var.as_ref(), casting.role, extra);

                        RolePlayer::new(role, casting.player.clone())
                    })
                    .collect();
                let mut properties = vec![Property::Relation(role_players)];

                if let Some(type_ref) = type_ref {
                    properties.push(Property::Isa {
                        type_ref,
                        direct: false,
                    });
                }

                properties
            }
            AtomKind::Resource {
                attribute,
                relation,
                values,
            } => {
                let attribute_type = self
                    .type_id
                    .and_then(|id| self.schema().label(id).cloned())
                    .unwrap_or_else(|| Label::new(schema::ATTRIBUTE));

                for value in values {
                    extra.push(Statement::new(
                        attribute.clone(),
                        vec![Property::Value(value.clone())],
                    ));
                }

                vec![Property::Has {
                    attribute_type,
                    attribute: attribute.clone(),
                    relation: relation.clone(),
                }]
            }
        };

        Statement::new(self.var.clone(), properties)
    }

    /// The statement this atom stands for, without any of its attached predicates.
    pub fn pattern(&self) -> Statement {
        self.statement(&mut Vec::new())
    }

    /// A conjunction equivalent to the atom, including the predicates attached to it.
    pub fn combined_pattern(&self) -> Conjunction {
        let mut extra = Vec::new();
        let mut statements = vec![self.statement(&mut extra)];

        statements.extend(extra);

        // Instance variables keep their id and value predicates.
        let mut instance_vars = FxIndexSet::default();
        match &self.kind {
            AtomKind::Relationship { castings } => {
                instance_vars.insert(self.var.clone());
                instance_vars.extend(castings.iter().map(|casting| casting.player.clone()));
            }
            AtomKind::Resource { attribute, .. } => {
                instance_vars.insert(self.var.clone());
                instance_vars.insert(attribute.clone());
            }
            _ => {}
        }

        for var in &instance_vars {
            if let Some(id) = self.id_of(var) {
                statements.push(Statement::new(var.clone(), vec![Property::Id(id)]));
            }

            if self.is_relationship() {
                statements.extend(
                    self.values_of(var)
                        .into_iter()
                        .map(|value| Statement::new(var.clone(), vec![Property::Value(value)])),
                );
            }
        }

        Conjunction::new(statements)
    }
}

impl fmt::Display for AtomRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pattern().fmt(f)
    }
}
