//! Predicates attached to query variables: id bindings and value constraints on attributes.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{id::ConceptId, variable::Variable};

/// Binds a variable to a concrete concept.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct IdPredicate {
    pub var: Variable,
    pub id: ConceptId,
}

impl IdPredicate {
    pub fn new(var: Variable, id: ConceptId) -> Self {
        Self { var, id }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Comparator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
}

impl Comparator {
    fn is_lower_bound(self) -> bool {
        matches!(self, Comparator::Gt | Comparator::Gte)
    }

    fn is_upper_bound(self) -> bool {
        matches!(self, Comparator::Lt | Comparator::Lte)
    }

    fn is_inclusive(self) -> bool {
        matches!(self, Comparator::Gte | Comparator::Lte)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparator::Eq => "==",
            Comparator::Neq => "!=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Contains => "contains",
        })
    }
}

/// An attribute value. Doubles compare by bit pattern for equality and hashing, so `NaN` equals
/// itself.
#[derive(Clone, Debug)]
pub enum Literal {
    String(Arc<str>),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

impl Literal {
    pub fn string(value: impl AsRef<str>) -> Self {
        Self::String(Arc::from(value.as_ref()))
    }

    /// Orders two literals, or returns `None` when they are of incomparable kinds. Longs and
    /// doubles compare numerically.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::String(a), Literal::String(b)) => Some(a.cmp(b)),
            (Literal::Long(a), Literal::Long(b)) => Some(a.cmp(b)),
            (Literal::Double(a), Literal::Double(b)) => a.partial_cmp(b),
            (Literal::Long(a), Literal::Double(b)) => (*a as f64).partial_cmp(b),
            (Literal::Double(a), Literal::Long(b)) => a.partial_cmp(&(*b as f64)),
            (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Literal::String(_) => 0,
            Literal::Long(_) => 1,
            Literal::Double(_) => 2,
            Literal::Boolean(_) => 3,
        }
    }

    /// A total order used to keep predicate collections canonical.
    fn canonical_cmp(&self, other: &Literal) -> Ordering {
        match (self, other) {
            (Literal::Double(a), Literal::Double(b)) => a.total_cmp(b),
            _ if self.discriminant() == other.discriminant() => {
                self.compare(other).unwrap_or(Ordering::Equal)
            }
            _ => self.discriminant().cmp(&other.discriminant()),
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Long(a), Literal::Long(b)) => a == b,
            (Literal::Double(a), Literal::Double(b)) => a.to_bits() == b.to_bits(),
            (Literal::Boolean(a), Literal::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);

        match self {
            Literal::String(value) => value.hash(state),
            Literal::Long(value) => value.hash(state),
            Literal::Double(value) => value.to_bits().hash(state),
            Literal::Boolean(value) => value.hash(state),
        }
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_cmp(other)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::string(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Long(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Double(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "{value:?}"),
            Literal::Long(value) => write!(f, "{value}"),
            Literal::Double(value) => write!(f, "{value:?}"),
            Literal::Boolean(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ValueOperation {
    pub comparator: Comparator,
    pub value: Literal,
}

impl ValueOperation {
    pub fn new(comparator: Comparator, value: impl Into<Literal>) -> Self {
        Self {
            comparator,
            value: value.into(),
        }
    }

    pub fn equals(value: impl Into<Literal>) -> Self {
        Self::new(Comparator::Eq, value)
    }

    /// Whether `literal` satisfies this operation.
    pub fn test(&self, literal: &Literal) -> bool {
        if let (Comparator::Contains, Literal::String(value), Literal::String(part)) =
            (self.comparator, literal, &self.value)
        {
            return value.contains(&**part);
        }

        let Some(ordering) = literal.compare(&self.value) else {
            return self.comparator == Comparator::Neq;
        };

        match self.comparator {
            Comparator::Eq => ordering.is_eq(),
            Comparator::Neq => ordering.is_ne(),
            Comparator::Gt => ordering.is_gt(),
            Comparator::Gte => ordering.is_ge(),
            Comparator::Lt => ordering.is_lt(),
            Comparator::Lte => ordering.is_le(),
            Comparator::Contains => false,
        }
    }

    /// Whether some literal can satisfy both operations. Answers `true` whenever that cannot be
    /// ruled out cheaply.
    pub fn is_compatible_with(&self, other: &ValueOperation) -> bool {
        use Comparator::*;

        match (self.comparator, other.comparator) {
            (Eq, _) => other.test(&self.value),
            (_, Eq) => self.test(&other.value),
            (Neq, _) | (_, Neq) => true,
            (Contains, Contains) => true,
            (Contains, _) => matches!(other.value, Literal::String(_)),
            (_, Contains) => matches!(self.value, Literal::String(_)),
            (lower, upper) if lower.is_lower_bound() && upper.is_upper_bound() => {
                Self::bounds_overlap(self, other)
            }
            (upper, lower) if upper.is_upper_bound() && lower.is_lower_bound() => {
                Self::bounds_overlap(other, self)
            }
            // Two bounds in the same direction always overlap.
            _ => self.value.compare(&other.value).is_some(),
        }
    }

    fn bounds_overlap(lower: &ValueOperation, upper: &ValueOperation) -> bool {
        match lower.value.compare(&upper.value) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => lower.comparator.is_inclusive() && upper.comparator.is_inclusive(),
            Some(Ordering::Greater) | None => false,
        }
    }

    /// Whether every literal satisfying `other` also satisfies this operation. Answers `false`
    /// whenever that cannot be established cheaply.
    pub fn subsumes(&self, other: &ValueOperation) -> bool {
        use Comparator::*;

        if other.comparator == Eq {
            return self.test(&other.value);
        }

        if self.comparator == Contains {
            return match (other.comparator, &other.value, &self.value) {
                (Contains, Literal::String(value), Literal::String(part)) => {
                    value.contains(&**part)
                }
                _ => false,
            };
        }

        let Some(ordering) = other.value.compare(&self.value) else {
            return false;
        };

        match (self.comparator, other.comparator) {
            (Eq, _) => false,
            (Neq, Neq) => ordering.is_eq(),
            (Neq, Gt) => ordering.is_ge(),
            (Neq, Gte) => ordering.is_gt(),
            (Neq, Lt) => ordering.is_le(),
            (Neq, Lte) => ordering.is_lt(),
            (Gt, Gt) | (Gte, Gte) | (Gte, Gt) => ordering.is_ge(),
            (Gt, Gte) => ordering.is_gt(),
            (Lt, Lt) | (Lte, Lte) | (Lte, Lt) => ordering.is_le(),
            (Lt, Lte) => ordering.is_lt(),
            _ => false,
        }
    }
}

impl fmt::Display for ValueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparator, self.value)
    }
}

/// Constrains an attribute variable's value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ValuePredicate {
    pub var: Variable,
    pub operation: ValueOperation,
}

impl ValuePredicate {
    pub fn new(var: Variable, operation: ValueOperation) -> Self {
        Self { var, operation }
    }
}

/// Either kind of predicate.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Predicate {
    Id(IdPredicate),
    Value(ValuePredicate),
}

impl Predicate {
    pub fn var(&self) -> &Variable {
        match self {
            Predicate::Id(predicate) => &predicate.var,
            Predicate::Value(predicate) => &predicate.var,
        }
    }
}
