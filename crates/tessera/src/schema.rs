//! The schema oracle consulted by the reasoning core, and an in-memory implementation of it.
//!
//! The core never stores schema information itself. Every question about the type lattice
//! (hierarchies, which roles a relation type relates, which roles a type plays) goes through
//! [`TypeSystem`]. [`Schema`] is a small, self-contained implementation suitable for tests and for
//! callers that keep their schema in memory.

use hashbrown::HashMap;

use crate::{
    error::SchemaError,
    id::{ConceptId, Id},
    label::Label,
    FxIndexSet,
};

pub const THING: &str = "thing";
pub const ENTITY: &str = "entity";
pub const RELATION: &str = "relation";
pub const ATTRIBUTE: &str = "attribute";
pub const ROLE: &str = "role";

const IMPLICIT_PREFIX: &str = "@has-";
const OWNER_SUFFIX: &str = "-owner";
const VALUE_SUFFIX: &str = "-value";

/// The implicit schema concepts backing attribute ownership. Owning an attribute of type `name`
/// is modelled as an implicit relation `@has-name` between an `@has-name-owner` and an
/// `@has-name-value`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImplicitType {
    Has,
    HasOwner,
    HasValue,
}

impl ImplicitType {
    pub fn label(self, attribute_type: &Label) -> Label {
        match self {
            ImplicitType::Has => Label::new(format!("{IMPLICIT_PREFIX}{attribute_type}")),
            ImplicitType::HasOwner => {
                Label::new(format!("{IMPLICIT_PREFIX}{attribute_type}{OWNER_SUFFIX}"))
            }
            ImplicitType::HasValue => {
                Label::new(format!("{IMPLICIT_PREFIX}{attribute_type}{VALUE_SUFFIX}"))
            }
        }
    }

    /// The attribute type label an implicit ownership relation type was derived from.
    pub fn attribute_label(implicit_relation_type: &Label) -> Option<Label> {
        implicit_relation_type
            .as_str()
            .strip_prefix(IMPLICIT_PREFIX)
            .filter(|attribute| {
                !attribute.ends_with(OWNER_SUFFIX) && !attribute.ends_with(VALUE_SUFFIX)
            })
            .map(Label::new)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DataType {
    String,
    Long,
    Double,
    Boolean,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConceptKind {
    Thing,
    EntityType,
    RelationType,
    AttributeType,
    Role,
}

impl ConceptKind {
    pub fn is_type(self) -> bool {
        !matches!(self, ConceptKind::Role)
    }
}

/// Ids of the concepts every schema starts with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MetaConcepts {
    pub thing: ConceptId,
    pub entity: ConceptId,
    pub relation: ConceptId,
    pub attribute: ConceptId,
    pub role: ConceptId,
}

impl MetaConcepts {
    pub fn contains(&self, id: ConceptId) -> bool {
        [
            self.thing,
            self.entity,
            self.relation,
            self.attribute,
            self.role,
        ]
        .contains(&id)
    }
}

/// Synchronous, read-only view of the schema.
///
/// Hierarchy queries never include the concept itself: [`TypeSystem::supertypes`] yields the
/// proper supertypes, nearest first, up to and including the meta concept at the root.
pub trait TypeSystem {
    fn resolve(&self, label: &str) -> Option<ConceptId>;

    fn label(&self, id: ConceptId) -> Option<&Label>;

    fn kind(&self, id: ConceptId) -> Option<ConceptKind>;

    fn supertypes(&self, id: ConceptId) -> Vec<ConceptId>;

    fn subtypes(&self, id: ConceptId) -> Vec<ConceptId>;

    /// Roles a relation type relates, including the ones it inherits.
    fn roles_of(&self, relation_type: ConceptId) -> Vec<ConceptId>;

    /// Roles instances of a type may play, including the ones it inherits.
    fn roles_playable_by(&self, type_id: ConceptId) -> Vec<ConceptId>;

    /// Non-meta relation types relating a role, directly or through inheritance.
    fn relation_types_with_role(&self, role: ConceptId) -> Vec<ConceptId>;

    /// A proxy for selectivity. Only the relative order of counts is meaningful.
    fn approx_instance_count(&self, type_id: ConceptId) -> u64;

    fn is_implicit(&self, id: ConceptId) -> bool;

    fn data_type(&self, attribute_type: ConceptId) -> Option<DataType>;

    fn meta(&self) -> MetaConcepts;
}

pub fn is_meta(type_system: &dyn TypeSystem, id: ConceptId) -> bool {
    type_system.meta().contains(id)
}

pub fn is_meta_role(type_system: &dyn TypeSystem, id: ConceptId) -> bool {
    type_system.meta().role == id
}

pub fn is_subtype_or_equal(type_system: &dyn TypeSystem, sub: ConceptId, sup: ConceptId) -> bool {
    sub == sup || type_system.supertypes(sub).contains(&sup)
}

/// Two types are disjoint when neither lies in the hierarchy of the other.
pub fn are_disjoint(type_system: &dyn TypeSystem, a: ConceptId, b: ConceptId) -> bool {
    !is_subtype_or_equal(type_system, a, b) && !is_subtype_or_equal(type_system, b, a)
}

/// Keeps the members of `concepts` none of whose proper supertypes are also members.
pub fn top(
    type_system: &dyn TypeSystem,
    concepts: impl IntoIterator<Item = ConceptId>,
) -> FxIndexSet<ConceptId> {
    let concepts = concepts.into_iter().collect::<FxIndexSet<_>>();

    concepts
        .iter()
        .copied()
        .filter(|&concept| {
            type_system
                .supertypes(concept)
                .iter()
                .all(|sup| !concepts.contains(sup))
        })
        .collect()
}

/// The subset of `roles` a player of `type_id` is allowed to play.
pub fn compatible_roles(
    type_system: &dyn TypeSystem,
    type_id: ConceptId,
    roles: &FxIndexSet<ConceptId>,
) -> FxIndexSet<ConceptId> {
    let playable = type_system.roles_playable_by(type_id);

    roles
        .iter()
        .copied()
        .filter(|role| playable.contains(role))
        .collect()
}

#[derive(Debug)]
struct SchemaConcept {
    label: Label,
    kind: ConceptKind,
    supertype: Option<ConceptId>,
    implicit: bool,
    instance_count: u64,
    data_type: Option<DataType>,
}

/// An in-memory [`TypeSystem`].
#[derive(Debug)]
pub struct Schema {
    concepts: Vec<SchemaConcept>,
    labels: HashMap<Label, ConceptId>,
    relates: HashMap<ConceptId, Vec<ConceptId>>,
    plays: HashMap<ConceptId, Vec<ConceptId>>,
    meta: MetaConcepts,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// A schema holding only the meta concepts.
    pub fn new() -> Self {
        let mut schema = Self {
            concepts: Vec::new(),
            labels: HashMap::new(),
            relates: HashMap::new(),
            plays: HashMap::new(),
            meta: MetaConcepts {
                thing: Id(0),
                entity: Id(1),
                relation: Id(2),
                attribute: Id(3),
                role: Id(4),
            },
        };

        let thing = schema.insert_concept(THING, ConceptKind::Thing, None, false);
        let entity = schema.insert_concept(ENTITY, ConceptKind::EntityType, Some(thing), false);
        let relation = schema.insert_concept(RELATION, ConceptKind::RelationType, Some(thing), false);
        let attribute =
            schema.insert_concept(ATTRIBUTE, ConceptKind::AttributeType, Some(thing), false);
        let role = schema.insert_concept(ROLE, ConceptKind::Role, None, false);

        schema.meta = MetaConcepts {
            thing,
            entity,
            relation,
            attribute,
            role,
        };

        schema
    }

    fn insert_concept(
        &mut self,
        label: &str,
        kind: ConceptKind,
        supertype: Option<ConceptId>,
        implicit: bool,
    ) -> ConceptId {
        let id = Id(self.concepts.len());
        let label = Label::new(label);

        self.concepts.push(SchemaConcept {
            label: label.clone(),
            kind,
            supertype,
            implicit,
            instance_count: 0,
            data_type: None,
        });
        self.labels.insert(label, id);

        id
    }

    fn concept(&self, id: ConceptId) -> Result<&SchemaConcept, SchemaError> {
        self.concepts
            .get(id.0)
            .ok_or(SchemaError::UnknownConcept { id })
    }

    fn define(
        &mut self,
        label: &str,
        kind: ConceptKind,
        supertype: ConceptId,
        implicit: bool,
    ) -> Result<ConceptId, SchemaError> {
        if self.labels.contains_key(label) {
            return Err(SchemaError::DuplicateLabel {
                label: Label::new(label),
            });
        }

        Ok(self.insert_concept(label, kind, Some(supertype), implicit))
    }

    fn expect_kind(
        &self,
        id: ConceptId,
        kind: ConceptKind,
        expected: &'static str,
    ) -> Result<(), SchemaError> {
        let concept = self.concept(id)?;

        if concept.kind == kind {
            Ok(())
        } else {
            Err(SchemaError::KindMismatch {
                label: concept.label.clone(),
                expected,
            })
        }
    }

    /// Defines an entity type directly under `entity`.
    pub fn new_entity_type(&mut self, label: &str) -> Result<ConceptId, SchemaError> {
        self.define(label, ConceptKind::EntityType, self.meta.entity, false)
    }

    /// Defines a relation type relating the given roles. Roles that do not exist yet are created.
    pub fn new_relation_type(
        &mut self,
        label: &str,
        roles: &[&str],
    ) -> Result<ConceptId, SchemaError> {
        let relation_type = self.define(label, ConceptKind::RelationType, self.meta.relation, false)?;

        for role in roles {
            self.relates(relation_type, role)?;
        }

        Ok(relation_type)
    }

    /// Defines an attribute type directly under `attribute`.
    pub fn new_attribute_type(
        &mut self,
        label: &str,
        data_type: DataType,
    ) -> Result<ConceptId, SchemaError> {
        let attribute_type =
            self.define(label, ConceptKind::AttributeType, self.meta.attribute, false)?;

        self.concepts[attribute_type].data_type = Some(data_type);

        Ok(attribute_type)
    }

    /// Makes `relation_type` relate the role labelled `role`, creating the role if needed.
    pub fn relates(
        &mut self,
        relation_type: ConceptId,
        role: &str,
    ) -> Result<ConceptId, SchemaError> {
        self.expect_kind(relation_type, ConceptKind::RelationType, "relation type")?;

        let role = match self.labels.get(role) {
            Some(&existing) => {
                self.expect_kind(existing, ConceptKind::Role, "role")?;
                existing
            }
            None => {
                let implicit = self.concepts[relation_type].implicit;
                self.define(role, ConceptKind::Role, self.meta.role, implicit)?
            }
        };

        let roles = self.relates.entry(relation_type).or_default();
        if !roles.contains(&role) {
            roles.push(role);
        }

        Ok(role)
    }

    /// Lets instances of `type_id` play `role`.
    pub fn plays(&mut self, type_id: ConceptId, role: ConceptId) -> Result<(), SchemaError> {
        let concept = self.concept(type_id)?;
        if !concept.kind.is_type() {
            return Err(SchemaError::KindMismatch {
                label: concept.label.clone(),
                expected: "type",
            });
        }
        self.expect_kind(role, ConceptKind::Role, "role")?;

        let roles = self.plays.entry(type_id).or_default();
        if !roles.contains(&role) {
            roles.push(role);
        }

        Ok(())
    }

    /// Lets instances of `owner` own attributes of `attribute_type`, through the implicit
    /// `@has-<attribute>` relation type.
    pub fn has(&mut self, owner: ConceptId, attribute_type: ConceptId) -> Result<(), SchemaError> {
        self.expect_kind(attribute_type, ConceptKind::AttributeType, "attribute type")?;

        let attribute_label = self.concepts[attribute_type].label.clone();
        let has_label = ImplicitType::Has.label(&attribute_label);
        let owner_label = ImplicitType::HasOwner.label(&attribute_label);
        let value_label = ImplicitType::HasValue.label(&attribute_label);

        let has = match self.labels.get(has_label.as_str()) {
            Some(&existing) => existing,
            None => self.define(
                has_label.as_str(),
                ConceptKind::RelationType,
                self.meta.relation,
                true,
            )?,
        };
        let owner_role = self.relates(has, owner_label.as_str())?;
        let value_role = self.relates(has, value_label.as_str())?;

        self.plays(owner, owner_role)?;
        self.plays(attribute_type, value_role)
    }

    /// Moves `sub` under `sup`. Both must be of the same kind, and `sup` may not be below `sub`.
    pub fn set_supertype(&mut self, sub: ConceptId, sup: ConceptId) -> Result<(), SchemaError> {
        let sub_concept = self.concept(sub)?;
        let sup_concept = self.concept(sup)?;

        let compatible = sub_concept.kind == sup_concept.kind
            || (sup_concept.kind == ConceptKind::Thing && sub_concept.kind.is_type());
        if !compatible {
            return Err(SchemaError::KindMismatch {
                label: sup_concept.label.clone(),
                expected: "concept of the same kind",
            });
        }

        if is_subtype_or_equal(&*self, sup, sub) {
            return Err(SchemaError::CyclicHierarchy {
                label: sub_concept.label.clone(),
            });
        }

        if let Some(data_type) = self.concepts[sup].data_type {
            self.concepts[sub].data_type = Some(data_type);
        }
        self.concepts[sub].supertype = Some(sup);

        Ok(())
    }

    pub fn set_instance_count(&mut self, type_id: ConceptId, count: u64) -> Result<(), SchemaError> {
        self.concept(type_id)?;
        self.concepts[type_id].instance_count = count;

        Ok(())
    }

    pub fn id(&self, label: &str) -> Option<ConceptId> {
        self.resolve(label)
    }

    fn declared(map: &HashMap<ConceptId, Vec<ConceptId>>, id: ConceptId) -> &[ConceptId] {
        map.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    fn with_supertypes(&self, id: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        std::iter::successors(Some(id), |&current| {
            self.concepts.get(current.0).and_then(|concept| concept.supertype)
        })
    }
}

impl TypeSystem for Schema {
    fn resolve(&self, label: &str) -> Option<ConceptId> {
        self.labels.get(label).copied()
    }

    fn label(&self, id: ConceptId) -> Option<&Label> {
        self.concepts.get(id.0).map(|concept| &concept.label)
    }

    fn kind(&self, id: ConceptId) -> Option<ConceptKind> {
        self.concepts.get(id.0).map(|concept| concept.kind)
    }

    fn supertypes(&self, id: ConceptId) -> Vec<ConceptId> {
        self.with_supertypes(id).skip(1).collect()
    }

    fn subtypes(&self, id: ConceptId) -> Vec<ConceptId> {
        (0..self.concepts.len())
            .map(Id)
            .filter(|&candidate| candidate != id && self.with_supertypes(candidate).any(|sup| sup == id))
            .collect()
    }

    fn roles_of(&self, relation_type: ConceptId) -> Vec<ConceptId> {
        let mut roles = FxIndexSet::default();

        for relation_type in self.with_supertypes(relation_type) {
            roles.extend(Self::declared(&self.relates, relation_type));
        }

        roles.into_iter().collect()
    }

    fn roles_playable_by(&self, type_id: ConceptId) -> Vec<ConceptId> {
        let mut roles = FxIndexSet::default();

        for type_id in self.with_supertypes(type_id) {
            roles.extend(Self::declared(&self.plays, type_id));
        }

        roles.into_iter().collect()
    }

    fn relation_types_with_role(&self, role: ConceptId) -> Vec<ConceptId> {
        (0..self.concepts.len())
            .map(Id)
            .filter(|&id| self.concepts[id].kind == ConceptKind::RelationType)
            .filter(|&id| id != self.meta.relation)
            .filter(|&id| self.roles_of(id).contains(&role))
            .collect()
    }

    fn approx_instance_count(&self, type_id: ConceptId) -> u64 {
        self.concepts
            .get(type_id.0)
            .map_or(0, |concept| concept.instance_count)
    }

    fn is_implicit(&self, id: ConceptId) -> bool {
        self.concepts.get(id.0).is_some_and(|concept| concept.implicit)
    }

    fn data_type(&self, attribute_type: ConceptId) -> Option<DataType> {
        self.concepts
            .get(attribute_type.0)
            .and_then(|concept| concept.data_type)
    }

    fn meta(&self) -> MetaConcepts {
        self.meta
    }
}
