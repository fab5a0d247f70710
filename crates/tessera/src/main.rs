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

use std::error::Error;

use tessera::{
    answer::Answer,
    atom::AtomType,
    pattern,
    rule::{applicable_rules, validate_rules},
    schema::DataType,
    InferenceRule, ReasonerQuery, Schema, UnifierType,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut schema = Schema::new();

    let person = schema.new_entity_type("person")?;
    let company = schema.new_entity_type("company")?;
    schema.new_relation_type("employment", &["employee", "employer"])?;
    schema.new_relation_type("friendship", &["friend"])?;

    let name = schema.new_attribute_type("name", DataType::String)?;

    for (player, role) in [(person, "employee"), (company, "employer"), (person, "friend")] {
        let role = schema
            .id(role)
            .ok_or_else(|| format!("role `{role}` is not defined"))?;

        schema.plays(player, role)?;
    }

    schema.has(person, name)?;

    let rules = [
        InferenceRule::new(
            &schema,
            "friends-of-colleagues",
            &pattern! {
                (employee: 'x, employer: 'c) isa employment;
                (employee: 'y, employer: 'c) isa employment;
            },
            &pattern! { (friend: 'x, friend: 'y) isa friendship; },
        )?,
        InferenceRule::new(
            &schema,
            "everyone-is-alice",
            &pattern! { 'x isa person; },
            &pattern! { 'x has name "Alice"; },
        )?,
    ];

    for (label, error) in validate_rules(&rules) {
        println!("rule {label}: {error}");
    }

    let query = ReasonerQuery::new(
        &schema,
        &pattern! {
            ('x, 'y);
            'x isa person;
            'y isa company;
            'x has name 'n;
        },
    )?
    .infer_types();

    println!("query: {}", query.pattern());

    for atom in query.atoms_of_kind(AtomType::Relationship) {
        println!("{atom} may have types:");

        for option in atom.atom_options(&Answer::new()) {
            println!("  {}", query.view(&option));
        }
    }

    for atom in query.atoms() {
        for rule in applicable_rules(&atom, &rules) {
            println!(
                "rule {} applies to {atom} with unifiers {}",
                rule.label(),
                rule.unifiers_with(&atom)?
            );
        }
    }

    let atoms = query.atoms().collect::<Vec<_>>();

    for child in &atoms {
        for parent in &atoms {
            if let Ok(unifiers) = child.unify(parent, UnifierType::Subsumptive) {
                if !unifiers.is_empty() {
                    println!("{child} is subsumed by {parent}: {unifiers}");
                }
            }
        }
    }

    Ok(())
}
