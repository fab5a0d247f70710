mod common;

use common::{id, var};
use pretty_assertions::assert_eq;
use tessera::{
    answer::{Answer, Concept},
    atom::{AtomType, Casting},
    id::{AtomId, Id},
    pattern, ReasonerQuery,
};

#[test]
fn test_ambiguous_roles_become_meta() {
    let schema = common::schema();

    let query = common::query(&schema, &pattern! { ('x, 'y) isa friendship; });
    let atom = query.atoms().next().unwrap();

    let inferred = atom.infer_types(&Answer::new());

    assert_eq!(
        inferred.castings(),
        &[
            Casting::new(Some(id(&schema, "role")), var("x")),
            Casting::new(Some(id(&schema, "role")), var("y")),
        ]
    );
}

#[test]
fn test_ambiguous_roles_with_typed_players_become_meta() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y) isa friendship;
            'x isa person;
            'y isa person;
        },
    );
    let atom = query.atoms_of_kind(AtomType::Relationship).next().unwrap();

    let inferred = atom.infer_types(&Answer::new());

    assert!(inferred
        .castings()
        .iter()
        .all(|casting| casting.role == Some(id(&schema, "role"))));
}

#[test]
fn test_unique_roles_are_assigned() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y) isa friendship;
            'x isa "person-a";
            'y isa "person-b";
        },
    );
    let atom = query.atoms_of_kind(AtomType::Relationship).next().unwrap();

    let inferred = atom.infer_types(&Answer::new());

    assert_eq!(
        inferred.castings(),
        &[
            Casting::new(Some(id(&schema, "friend1")), var("x")),
            Casting::new(Some(id(&schema, "friend2")), var("y")),
        ]
    );

    // Inferring again changes nothing.
    let again = query.view(&inferred).infer_types(&Answer::new());
    assert_eq!(again, inferred);
}

#[test]
fn test_meta_roles_are_refined_by_player_types() {
    let schema = common::schema();

    let typed = common::query(
        &schema,
        &pattern! {
            (role: 'x, role: 'y) isa friendship;
            'x isa "person-a";
            'y isa "person-b";
        },
    );
    let untyped = common::query(&schema, &pattern! { (role: 'x, role: 'y) isa friendship; });

    let typed = typed.atoms_of_kind(AtomType::Relationship).next().unwrap();
    let untyped = untyped.atoms_of_kind(AtomType::Relationship).next().unwrap();

    assert_eq!(
        typed.infer_types(&Answer::new()).castings(),
        &[
            Casting::new(Some(id(&schema, "friend1")), var("x")),
            Casting::new(Some(id(&schema, "friend2")), var("y")),
        ]
    );
    assert_eq!(&untyped.infer_types(&Answer::new()), untyped.atom());
}

#[test]
fn test_explicit_roles_and_role_variables_are_kept() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            (friend2: 'x, 'r: 'y) isa friendship;
            'x isa person;
        },
    );
    let atom = query.atoms_of_kind(AtomType::Relationship).next().unwrap();

    let inferred = atom.infer_types(&Answer::new());

    assert_eq!(inferred.castings(), atom.castings());
}

#[test]
fn test_relation_type_is_inferred_from_explicit_roles() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            (owned: 'y, 'x);
            'x isa person;
        },
    );
    let atom = query.atoms_of_kind(AtomType::Relationship).next().unwrap();

    assert_eq!(
        atom.infer_possible_types(&Answer::new()),
        vec![id(&schema, "ownership")]
    );

    let inferred = atom.infer_types(&Answer::new());

    assert_eq!(inferred.type_id(), Some(id(&schema, "ownership")));
    assert_eq!(
        inferred.castings(),
        &[
            Casting::new(Some(id(&schema, "owned")), var("y")),
            Casting::new(Some(id(&schema, "owner")), var("x")),
        ]
    );
}

#[test]
fn test_relation_types_are_ranked() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y);
            'x isa person;
            'y isa company;
        },
    );
    let atom = query.atoms_of_kind(AtomType::Relationship).next().unwrap();

    let possible_types = atom.infer_possible_types(&Answer::new());

    assert_eq!(
        possible_types,
        vec![id(&schema, "employment"), id(&schema, "@has-name")]
    );

    // Two candidates remain, so the type is left open.
    assert_eq!(atom.infer_types(&Answer::new()).type_id(), None);

    let options = atom.atom_options(&Answer::new());

    assert_eq!(options.len(), 2);
    assert_eq!(options[0].type_id(), Some(id(&schema, "employment")));
    assert_eq!(
        options[0].castings(),
        &[
            Casting::new(Some(id(&schema, "employee")), var("x")),
            Casting::new(Some(id(&schema, "employer")), var("y")),
        ]
    );
    assert_eq!(options[1].type_id(), Some(id(&schema, "@has-name")));
}

#[test]
fn test_untyped_relation_considers_every_relation_type() {
    let schema = common::schema();

    let query = common::query(&schema, &pattern! { ('x, 'y); });
    let atom = query.atoms().next().unwrap();

    let possible_types = atom.infer_possible_types(&Answer::new());

    // Most instances first.
    assert_eq!(
        &possible_types[..3],
        &[
            id(&schema, "friendship"),
            id(&schema, "employment"),
            id(&schema, "ownership"),
        ]
    );
    assert!(possible_types.contains(&id(&schema, "@has-age")));
}

#[test]
fn test_answer_binds_the_relation_type() {
    let schema = common::schema();

    let query = common::query(&schema, &pattern! { ('x, 'y) isa 't; });
    let atom = query.atoms().next().unwrap();

    let answer = Answer::from_iter([(var("t"), Concept::Type(id(&schema, "employment")))]);

    assert_eq!(
        atom.infer_possible_types(&answer),
        vec![id(&schema, "employment")]
    );
}

#[test]
fn test_answer_types_role_players() {
    let schema = common::schema();

    let query = common::query(&schema, &pattern! { ('x, 'y) isa friendship; });
    let atom = query.atoms().next().unwrap();

    let answer = Answer::from_iter([
        (
            var("x"),
            Concept::Thing {
                id: Id(1000),
                type_id: id(&schema, "person-a"),
            },
        ),
        (
            var("y"),
            Concept::Thing {
                id: Id(1001),
                type_id: id(&schema, "person-b"),
            },
        ),
    ]);

    let inferred = atom.infer_types(&answer);

    assert_eq!(
        inferred.role_labels().into_iter().collect::<Vec<_>>(),
        vec![id(&schema, "friend1"), id(&schema, "friend2")]
    );
}

#[test]
fn test_query_wide_inference() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y);
            'x isa person;
            'y isa pet;
            'x has name 'n;
        },
    );

    let inferred = query.infer_types();
    let relationship = inferred
        .atoms_of_kind(AtomType::Relationship)
        .next()
        .unwrap();

    assert_ne!(inferred.id(), query.id());
    assert_eq!(inferred.len(), query.len());
    assert_eq!(relationship.type_id(), None);
    assert_eq!(
        relationship.infer_possible_types(&Answer::new()),
        vec![id(&schema, "ownership"), id(&schema, "@has-name")]
    );
}

#[test]
fn test_substitution_types_role_players() {
    let schema = common::schema();

    let substitution = Answer::from_iter([
        (
            var("x"),
            Concept::Thing {
                id: Id(1000),
                type_id: id(&schema, "person-a"),
            },
        ),
        (
            var("y"),
            Concept::Thing {
                id: Id(1001),
                type_id: id(&schema, "person-b"),
            },
        ),
    ]);
    let query = ReasonerQuery::with_substitution(
        &schema,
        &pattern! { ('x, 'y) isa friendship; },
        substitution,
    )
    .unwrap();

    assert_eq!(
        query.id_predicate(&var("x")).map(|predicate| predicate.id),
        Some(Id(1000))
    );

    let inferred = query.infer_types();
    let atom = inferred.atoms().next().unwrap();

    assert_eq!(
        atom.castings(),
        &[
            Casting::new(Some(id(&schema, "friend1")), var("x")),
            Casting::new(Some(id(&schema, "friend2")), var("y")),
        ]
    );
    assert_eq!(
        atom.role_type_map(&Answer::new()).get(&id(&schema, "friend1")),
        Some(&vec![id(&schema, "person-a")])
    );
}

#[test]
fn test_replacing_an_atom_rehomes_the_query() {
    let schema = common::schema();

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y) isa friendship;
            'x isa "person-a";
            'y isa "person-b";
        },
    );
    let inferred = query
        .atom_ref(AtomId(0))
        .unwrap()
        .infer_types(&Answer::new());

    let replaced = query.with_atom_replaced(AtomId(0), inferred.clone());

    assert_ne!(replaced.id(), query.id());
    assert_eq!(replaced.atom_ref(AtomId(0)).unwrap().atom(), &inferred);
    assert_eq!(
        replaced.atom_ref(AtomId(1)).unwrap().atom(),
        query.atom_ref(AtomId(1)).unwrap().atom()
    );
    assert_eq!(replaced.atom_ref(AtomId(0)).unwrap().query_id(), replaced.id());
    assert!(replaced.atom_ref(AtomId(3)).is_none());
}
