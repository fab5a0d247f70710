use std::{
    fmt,
    ops::{Index, IndexMut},
    sync::atomic::{AtomicUsize, Ordering},
};

/// An opaque reference to a concept, either a schema concept (a type or a role) or an instance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Id(pub usize);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

pub type ConceptId = Id;

/// Handle of a [`ReasonerQuery`](crate::query::ReasonerQuery). Atoms store it instead of a
/// reference to the query owning them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct QueryId(pub(crate) usize);

/// Index of an atom inside the query owning it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AtomId(pub usize);

#[derive(Debug)]
pub(crate) struct IdGenerator {
    next: AtomicUsize,
}

impl IdGenerator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
        }
    }

    pub(crate) fn generate_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl<T> Index<Id> for Vec<T> {
    type Output = T;

    fn index(&self, index: Id) -> &Self::Output {
        &self[index.0]
    }
}

impl<T> IndexMut<Id> for Vec<T> {
    fn index_mut(&mut self, index: Id) -> &mut Self::Output {
        &mut self[index.0]
    }
}
