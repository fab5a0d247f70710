//! An already-parsed conjunctive pattern. Atoms are built from it and render back into it.

use std::fmt;

use crate::{id::ConceptId, label::Label, predicate::ValueOperation, variable::Variable};

/// The operand of a schema-level property, written either as a label or as a variable.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
    Label(Label),
    Var(Variable),
}

pub type RoleRef = TypeRef;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RolePlayer {
    pub role: Option<RoleRef>,
    pub player: Variable,
}

impl RolePlayer {
    pub fn new(role: Option<RoleRef>, player: Variable) -> Self {
        Self { role, player }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Property {
    /// `isa type`, or `isa! type` when `direct` is set.
    Isa { type_ref: TypeRef, direct: bool },
    Sub(TypeRef),
    Plays(TypeRef),
    Relates(TypeRef),
    /// Schema-level attribute ownership, `has name`.
    HasType(TypeRef),
    /// Instance-level attribute ownership, `has name $n`, optionally naming the ownership edge with
    /// `via $r`.
    Has {
        attribute_type: Label,
        attribute: Variable,
        relation: Option<Variable>,
    },
    Relation(Vec<RolePlayer>),
    Id(ConceptId),
    /// Binds the variable to the schema concept with this label.
    Type(Label),
    Value(ValueOperation),
}

impl Property {
    /// Whether an atom, rather than a predicate, is built from this property.
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Property::Id(_) | Property::Type(_) | Property::Value(_))
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Statement {
    pub var: Variable,
    pub properties: Vec<Property>,
}

impl Statement {
    pub fn new(var: Variable, properties: Vec<Property>) -> Self {
        Self { var, properties }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Conjunction {
    pub statements: Vec<Statement>,
}

impl Conjunction {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn extend(&mut self, other: Conjunction) {
        self.statements.extend(other.statements);
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.statements.iter().map(|statement| &statement.var)
    }
}

impl FromIterator<Statement> for Conjunction {
    fn from_iter<T: IntoIterator<Item = Statement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Label(label) => label.fmt(f),
            TypeRef::Var(var) => var.fmt(f),
        }
    }
}

impl fmt::Display for RolePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{role}: {}", self.player),
            None => self.player.fmt(f),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Isa {
                type_ref,
                direct: false,
            } => write!(f, "isa {type_ref}"),
            Property::Isa {
                type_ref,
                direct: true,
            } => write!(f, "isa! {type_ref}"),
            Property::Sub(type_ref) => write!(f, "sub {type_ref}"),
            Property::Plays(type_ref) => write!(f, "plays {type_ref}"),
            Property::Relates(type_ref) => write!(f, "relates {type_ref}"),
            Property::HasType(type_ref) => write!(f, "has {type_ref}"),
            Property::Has {
                attribute_type,
                attribute,
                relation,
            } => {
                write!(f, "has {attribute_type} {attribute}")?;

                if let Some(relation) = relation {
                    write!(f, " via {relation}")?;
                }

                Ok(())
            }
            Property::Relation(role_players) => {
                f.write_str("(")?;

                for (index, role_player) in role_players.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }

                    role_player.fmt(f)?;
                }

                f.write_str(")")
            }
            Property::Id(id) => write!(f, "id {id}"),
            Property::Type(label) => write!(f, "type {label}"),
            Property::Value(operation) => operation.fmt(f),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Relations read as `$r (a: $x, b: $y) isa t`.
        let (relations, rest): (Vec<_>, Vec<_>) = self
            .properties
            .iter()
            .partition(|property| matches!(property, Property::Relation(_)));

        write!(f, "{}", self.var)?;

        for property in relations.into_iter().chain(rest) {
            write!(f, " {property}")?;
        }

        f.write_str(";")
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, statement) in self.statements.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }

            statement.fmt(f)?;
        }

        Ok(())
    }
}
