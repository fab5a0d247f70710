//! Errors raised while building atoms, unifying them and validating rules.

use thiserror::Error;

use crate::{atom::AtomType, id::ConceptId, label::Label, variable::Variable};

/// Errors of the reasoning core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasonerError {
    /// A label used in a pattern does not name a schema concept
    #[error("schema concept `{label}` was not found")]
    SchemaConceptNotFound { label: Label },

    /// An id predicate names a concept the schema does not know
    #[error("concept {id} was not found")]
    ConceptNotFound { id: ConceptId },

    /// The two atoms can never be unified, whatever their contents
    #[error("a {child} atom cannot be unified with a {parent} atom")]
    IncompatibleUnificationTargets { child: AtomType, parent: AtomType },

    /// An atom conversion was requested that the atom's contents do not support
    #[error("a {from} atom cannot be converted into a {to} atom: {reason}")]
    IllegalAtomConversion {
        from: AtomType,
        to: AtomType,
        reason: &'static str,
    },

    /// A statement carries no property an atom or a predicate can be built from
    #[error("statement for {var} has no atomic property")]
    UnsupportedStatement { var: Variable },

    /// A rule failed validation. Every problem found is reported
    #[error("rule `{label}` is invalid:\n{}", errors.join("\n"))]
    InvalidRule { label: Label, errors: Vec<String> },
}

pub type ReasonerResult<T> = Result<T, ReasonerError>;

/// Errors raised while defining an in-memory [`Schema`](crate::schema::Schema).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("label `{label}` is already defined")]
    DuplicateLabel { label: Label },

    #[error("concept {id} was not found")]
    UnknownConcept { id: ConceptId },

    #[error("concept `{label}` is not a {expected}")]
    KindMismatch {
        label: Label,
        expected: &'static str,
    },

    #[error("`{label}` cannot be a subtype of itself or of one of its subtypes")]
    CyclicHierarchy { label: Label },
}
