// SPDX-FileCopyrightText: 2024 Yoav Grimland <miestrode@proton.me>
// SPDX-License-Identifier: Apache-2.0
//
// Copyright 2024 Yoav Grimland miestrode@proton.me
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Atom-level machinery of a backward-chaining reasoner over a typed knowledge graph.
//!
//! A conjunctive [`pattern`] is decomposed into the atoms of a [`ReasonerQuery`]. Atoms can then
//! be typed by [`inference`] against a [`TypeSystem`], compared at several levels of
//! [`equivalence`] and [`unified`](atom::AtomRef::unify) with each other, which is what a resolver
//! uses to match query atoms against cached answers and against the heads of [`InferenceRule`]s.

extern crate self as tessera;

pub mod answer;
mod applicability;
pub mod atom;
pub mod equivalence;
pub mod error;
pub mod id;
pub mod inference;
pub mod label;
pub mod pattern;
pub mod predicate;
pub mod query;
pub mod rule;
pub mod schema;
pub mod unification;
pub mod unifier;
mod validation;
pub mod variable;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

#[allow(clippy::disallowed_types)]
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
#[allow(clippy::disallowed_types)]
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

pub use atom::{Atom, AtomKind, AtomRef, AtomType};
pub use equivalence::AtomicEquivalence;
pub use error::{ReasonerError, ReasonerResult};
pub use query::ReasonerQuery;
pub use rule::InferenceRule;
pub use schema::{Schema, TypeSystem};
pub use tessera_macros::pattern;
pub use unification::UnifierType;
pub use unifier::{MultiUnifier, Unifier};
