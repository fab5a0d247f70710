mod common;

use common::var;
use pretty_assertions::assert_eq;
use tessera::{atom::AtomType, pattern, MultiUnifier, ReasonerError, Unifier, UnifierType};

#[test]
fn test_equal_atoms_unify_trivially() {
    let schema = common::schema();

    let child = common::query(&schema, &pattern! { 'f (friend1: 'x, friend2: 'y) isa friendship; });
    let parent = common::query(&schema, &pattern! { 'f (friend1: 'x, friend2: 'y) isa friendship; });

    let child = child.atoms().next().unwrap();
    let parent = parent.atoms().next().unwrap();

    for unifier_type in [
        UnifierType::Exact,
        UnifierType::Structural,
        UnifierType::Subsumptive,
        UnifierType::Rule,
    ] {
        let unifiers = child.unify(&parent, unifier_type).unwrap();

        assert!(unifiers.is_trivial());
        assert_eq!(unifiers, MultiUnifier::trivial());
    }
}

#[test]
fn test_symmetric_relation_unifies_both_ways() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { ('x, 'y) isa friendship; }).infer_types();
    let head = common::query(&schema, &pattern! { ('a, 'b) isa friendship; }).infer_types();

    let parent = parent.atoms().next().unwrap();
    let head = head.atoms().next().unwrap();

    let meta_role = schema.id("role");
    assert!(parent.castings().iter().all(|casting| casting.role == meta_role));
    assert!(head.castings().iter().all(|casting| casting.role == meta_role));

    for unifier_type in [UnifierType::Exact, UnifierType::Rule] {
        let unifiers = head.unify(&parent, unifier_type).unwrap();

        assert_eq!(unifiers.len(), 2);
        assert!(unifiers.contains(&Unifier::from([(var("a"), var("x")), (var("b"), var("y"))])));
        assert!(unifiers.contains(&Unifier::from([(var("a"), var("y")), (var("b"), var("x"))])));
    }
}

#[test]
fn test_explicit_roles_pin_the_mapping() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { 'r (friend1: 'x, friend2: 'y) isa friendship; });
    let child = common::query(&schema, &pattern! { 'f (friend2: 'b, friend1: 'a) isa friendship; });

    let parent = parent.atoms().next().unwrap();
    let child = child.atoms().next().unwrap();

    let unifiers = child.unify(&parent, UnifierType::Exact).unwrap();

    assert_eq!(
        unifiers.unifier(),
        Some(&Unifier::from([
            (var("f"), var("r")),
            (var("a"), var("x")),
            (var("b"), var("y")),
        ]))
    );
}

#[test]
fn test_repeated_player_is_not_mapped_twice() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { ('x, 'y) isa friendship; });
    let child = common::query(&schema, &pattern! { ('a, 'a) isa friendship; });

    let parent = parent.atoms().next().unwrap();
    let child = child.atoms().next().unwrap();

    // `$a` would have to map to both `$x` and `$y`, and the other way round `$x` and `$y` would
    // both map to `$a`.
    assert!(child.unify(&parent, UnifierType::Exact).unwrap().is_empty());
    assert!(parent.unify(&child, UnifierType::Exact).unwrap().is_empty());
}

#[test]
fn test_role_variables_are_mapped() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { ('r: 'x, friend2: 'y) isa friendship; });
    let child = common::query(&schema, &pattern! { (friend1: 'a, friend2: 'b) isa friendship; });

    let parent = parent.atoms().next().unwrap();
    let child = child.atoms().next().unwrap();
    let rewritten = child.rewrite_to_user_defined(parent.atom());
    let unifiers = child
        .query()
        .view(&rewritten)
        .unify(&parent, UnifierType::Rule)
        .unwrap();

    assert_eq!(unifiers.len(), 1);

    let unifier = unifiers.iter().next().unwrap();
    assert!(unifier.contains(&var("a"), &var("x")));
    assert!(unifier.contains(&var("b"), &var("y")));
    assert!(unifier.values().any(|parent| parent == &var("r")));
}

#[test]
fn test_resource_unifies_with_implicit_relationship() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { 'x has name 'n; });
    let head = common::query(
        &schema,
        &pattern! { ("@has-name-owner": 'p, "@has-name-value": 'v) isa "@has-name"; },
    );

    let parent = parent.atoms().next().unwrap();
    let head = head.atoms().next().unwrap();

    let unifiers = head.unify(&parent, UnifierType::Rule).unwrap();

    assert_eq!(
        unifiers.unifier(),
        Some(&Unifier::from([(var("p"), var("x")), (var("v"), var("n"))]))
    );
}

#[test]
fn test_resource_values_must_match_exactly() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { 'x has name 'n; 'n == "Alice"; });
    let same = common::query(&schema, &pattern! { 'y has name 'm; 'm == "Alice"; });
    let other = common::query(&schema, &pattern! { 'y has name 'm; 'm == "Bob"; });

    let parent = parent.atoms().next().unwrap();
    let same = same.atoms().next().unwrap();
    let other = other.atoms().next().unwrap();

    assert_eq!(
        same.unify(&parent, UnifierType::Exact).unwrap().unifier(),
        Some(&Unifier::from([(var("y"), var("x")), (var("m"), var("n"))]))
    );
    assert!(other.unify(&parent, UnifierType::Exact).unwrap().is_empty());
    assert!(!other.unify(&parent, UnifierType::Structural).unwrap().is_empty());
}

#[test]
fn test_subsumptive_unification_follows_the_hierarchy() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { 'x isa entity; });
    let child = common::query(&schema, &pattern! { 'y isa person; });

    let parent = parent.atoms().next().unwrap();
    let child = child.atoms().next().unwrap();

    assert_eq!(
        child.unify(&parent, UnifierType::Subsumptive).unwrap().unifier(),
        Some(&Unifier::from([(var("y"), var("x"))]))
    );
    assert!(parent.unify(&child, UnifierType::Subsumptive).unwrap().is_empty());
    assert!(child.unify(&parent, UnifierType::Exact).unwrap().is_empty());
}

#[test]
fn test_incompatible_targets_are_rejected() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            't sub entity;
            ('x, 'y) isa friendship;
            'x isa person;
        },
    );

    let sub = query.atoms_of_kind(AtomType::Sub).next().unwrap();
    let relationship = query.atoms_of_kind(AtomType::Relationship).next().unwrap();
    let isa = query.atoms_of_kind(AtomType::Isa).next().unwrap();

    assert_eq!(
        sub.unify(&relationship, UnifierType::Exact),
        Err(ReasonerError::IncompatibleUnificationTargets {
            child: AtomType::Sub,
            parent: AtomType::Relationship,
        })
    );
    assert_eq!(
        isa.unify(&sub, UnifierType::Rule),
        Err(ReasonerError::IncompatibleUnificationTargets {
            child: AtomType::Isa,
            parent: AtomType::Sub,
        })
    );
}

#[test]
fn test_unifiers_are_injective() {
    let schema = common::schema();

    let parent = common::query(&schema, &pattern! { ('x, 'y, 'z) isa friendship; });
    let child = common::query(&schema, &pattern! { ('a, 'b, 'c) isa friendship; });

    let parent = parent.atoms().next().unwrap();
    let child = child.atoms().next().unwrap();

    let unifiers = child.unify(&parent, UnifierType::Exact).unwrap();

    assert_eq!(unifiers.len(), 6);

    for unifier in &unifiers {
        assert!(unifier.is_functional());
        assert!(unifier.is_injective());
        assert_eq!(unifier.len(), 3);
    }
}
