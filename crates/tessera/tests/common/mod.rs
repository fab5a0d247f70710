#![allow(dead_code)]

use tessera::{
    id::ConceptId,
    pattern::Conjunction,
    schema::{DataType, Schema},
    variable::Variable,
    ReasonerQuery, TypeSystem,
};

/// People befriend each other, work for companies and own pets. `person-a` and `person-b` can
/// each only be one side of a friendship.
pub fn schema() -> Schema {
    let mut schema = Schema::new();

    let person = schema.new_entity_type("person").unwrap();
    let person_a = schema.new_entity_type("person-a").unwrap();
    let person_b = schema.new_entity_type("person-b").unwrap();
    let company = schema.new_entity_type("company").unwrap();
    let pet = schema.new_entity_type("pet").unwrap();

    let friendship = schema
        .new_relation_type("friendship", &["friend1", "friend2"])
        .unwrap();
    let employment = schema
        .new_relation_type("employment", &["employee", "employer"])
        .unwrap();
    let ownership = schema
        .new_relation_type("ownership", &["owner", "owned"])
        .unwrap();

    let friend1 = schema.id("friend1").unwrap();
    let friend2 = schema.id("friend2").unwrap();

    schema.plays(person, friend1).unwrap();
    schema.plays(person, friend2).unwrap();
    schema.plays(person_a, friend1).unwrap();
    schema.plays(person_b, friend2).unwrap();
    schema.plays(person, schema.id("employee").unwrap()).unwrap();
    schema.plays(company, schema.id("employer").unwrap()).unwrap();
    schema.plays(person, schema.id("owner").unwrap()).unwrap();
    schema.plays(pet, schema.id("owned").unwrap()).unwrap();

    let name = schema.new_attribute_type("name", DataType::String).unwrap();
    let age = schema.new_attribute_type("age", DataType::Long).unwrap();

    schema.has(person, name).unwrap();
    schema.has(company, name).unwrap();
    schema.has(pet, name).unwrap();
    schema.has(person, age).unwrap();

    schema.set_instance_count(friendship, 100).unwrap();
    schema.set_instance_count(employment, 50).unwrap();
    schema.set_instance_count(ownership, 10).unwrap();

    schema
}

pub fn query<'s>(schema: &'s Schema, pattern: &Conjunction) -> ReasonerQuery<'s> {
    ReasonerQuery::new(schema, pattern).unwrap()
}

pub fn id(schema: &Schema, label: &str) -> ConceptId {
    schema.resolve(label).unwrap()
}

pub fn var(name: &str) -> Variable {
    Variable::named(name)
}
