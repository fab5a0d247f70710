mod common;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tessera::{
    id::Id,
    label::Label,
    pattern,
    pattern::{Conjunction, Property, Statement},
    predicate::{Comparator, ValueOperation},
    rule::applicable_rules,
    variable::Variable,
    AtomRef, InferenceRule,
};

const SEED: u64 = 7;
const ITERATIONS: usize = 200;

const COMPARATORS: [Comparator; 6] = [
    Comparator::Eq,
    Comparator::Neq,
    Comparator::Gt,
    Comparator::Gte,
    Comparator::Lt,
    Comparator::Lte,
];

/// `$owner has <attribute_type> $attribute`, with an optional value on the attribute.
fn ownership(
    owner: &str,
    attribute_type: &str,
    attribute: &str,
    value: Option<ValueOperation>,
) -> Conjunction {
    let attribute = Variable::named(attribute);
    let mut statements = vec![Statement::new(
        Variable::named(owner),
        vec![Property::Has {
            attribute_type: Label::new(attribute_type),
            attribute: attribute.clone(),
            relation: None,
        }],
    )];

    statements.extend(value.map(|value| Statement::new(attribute, vec![Property::Value(value)])));

    Conjunction::new(statements)
}

fn random_operation(rng: &mut impl Rng) -> ValueOperation {
    ValueOperation::new(*COMPARATORS.choose(rng).unwrap(), rng.gen_range(0..10_i64))
}

#[test]
fn test_loosening_the_query_keeps_heads_applicable() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let schema = common::schema();

    for _ in 0..ITERATIONS {
        let head_value = random_operation(&mut rng);
        let query_value = random_operation(&mut rng);

        let head = common::query(&schema, &ownership("p", "age", "a", Some(head_value.clone())));
        let strict = common::query(&schema, &ownership("x", "age", "n", Some(query_value.clone())));
        let loose = common::query(&schema, &ownership("x", "age", "n", None));
        let widened = common::query(&schema, &ownership("x", "attribute", "n", None));

        let head = head.atoms().next().unwrap();
        let strict = strict.atoms().next().unwrap();
        let loose = loose.atoms().next().unwrap();
        let widened = widened.atoms().next().unwrap();

        let applicable = strict.is_rule_applicable(&head);

        assert_eq!(
            applicable,
            query_value.is_compatible_with(&head_value),
            "{head} against {strict}"
        );

        if applicable {
            assert!(loose.is_rule_applicable(&head), "{head} against {loose}");
            assert!(widened.is_rule_applicable(&head), "{head} against {widened}");
        }
    }
}

#[test]
fn test_loosening_relationships_keeps_heads_applicable() {
    let schema = common::schema();

    let heads = [
        common::query(&schema, &pattern! { (friend1: 'a, friend2: 'b) isa friendship; }),
        common::query(
            &schema,
            &pattern! {
                (employee: 'a, employer: 'b) isa employment;
                'a isa person;
            },
        ),
        common::query(&schema, &pattern! { (owner: 'a, owned: 'b) isa ownership; }),
    ];

    // Each query next to a looser version of itself.
    let loosenings = [
        (
            pattern! {
                ('x, 'y) isa friendship;
                'x isa "person-b";
                'y isa "person-b";
            },
            pattern! {
                ('x, 'y);
                'x isa "person-b";
                'y isa "person-b";
            },
        ),
        (
            pattern! {
                ('x, 'y) isa friendship;
                'x isa "person-a";
                'y isa "person-b";
            },
            pattern! {
                ('x, 'y) isa friendship;
                'x isa person;
                'y isa "person-b";
            },
        ),
        (
            pattern! {
                ('x, 'y) isa employment;
                'x isa person;
                'y isa company;
            },
            pattern! {
                ('x, 'y);
                'x isa person;
                'y isa company;
            },
        ),
        (
            pattern! {
                (employee: 'x, employer: 'y) isa employment;
                'x id Id(1000);
            },
            pattern! { (employee: 'x, employer: 'y) isa employment; },
        ),
        (
            pattern! {
                ('x, 'y) isa friendship;
                'x isa "person-a";
            },
            pattern! {
                ('x, 'y) isa relation;
                'x isa "person-a";
            },
        ),
        (
            pattern! { (friend1: 'x, friend2: 'y) isa friendship; },
            pattern! { (friend1: 'x, 'y) isa friendship; },
        ),
    ];

    for head in &heads {
        let head = head.atoms().next().unwrap();

        for (strict, loose) in &loosenings {
            let strict = common::query(&schema, strict);
            let loose = common::query(&schema, loose);

            let strict = strict.atoms().next().unwrap();
            let loose = loose.atoms().next().unwrap();

            if strict.is_rule_applicable(&head) {
                assert!(
                    loose.is_rule_applicable(&head),
                    "{head} applies to {strict} but not to {loose}"
                );
            }
        }
    }
}

#[test]
fn test_relation_type_does_not_hide_player_roles() {
    let schema = common::schema();

    let head = common::query(&schema, &pattern! { (friend1: 'a, friend2: 'b) isa friendship; });
    let typed = common::query(
        &schema,
        &pattern! {
            ('x, 'y) isa friendship;
            'x isa "person-b";
            'y isa "person-b";
        },
    );
    let untyped = common::query(
        &schema,
        &pattern! {
            ('x, 'y);
            'x isa "person-b";
            'y isa "person-b";
        },
    );

    let head = head.atoms().next().unwrap();

    // Both players can only be `friend2`, which the head binds once.
    assert!(!typed.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(!untyped.atoms().next().unwrap().is_rule_applicable(&head));
}

#[test]
fn test_contradicting_values_are_not_applicable() {
    let schema = common::schema();

    let head = common::query(&schema, &pattern! { 'p has age 'a; 'a > 5; });
    let below = common::query(&schema, &pattern! { 'x has age 'n; 'n < 3; });
    let above = common::query(&schema, &pattern! { 'x has age 'n; 'n >= 4; });
    let other = common::query(&schema, &pattern! { 'x has name 'n; });

    let head = head.atoms().next().unwrap();

    assert!(!below.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(above.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(!other.atoms().next().unwrap().is_rule_applicable(&head));
}

#[test]
fn test_isa_heads_follow_the_hierarchy() {
    let schema = common::schema();

    let head = common::query(&schema, &pattern! { 'p isa person; });
    let narrower = common::query(&schema, &pattern! { 'x isa "person-a"; });
    let same = common::query(&schema, &pattern! { 'x isa person; });
    let wider = common::query(&schema, &pattern! { 'x isa entity; });
    let unrelated = common::query(&schema, &pattern! { 'x isa company; });

    let head = head.atoms().next().unwrap();

    assert!(!narrower.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(same.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(wider.atoms().next().unwrap().is_rule_applicable(&head));
    assert!(!unrelated.atoms().next().unwrap().is_rule_applicable(&head));
}

#[test]
fn test_relationship_heads_cover_partially_typed_queries() {
    let schema = common::schema();

    let head = common::query(&schema, &pattern! { (employee: 'a, employer: 'b) isa employment; });
    let head = head.atoms().next().unwrap();

    for query in [
        pattern! { (employee: 'x, employer: 'y) isa employment; },
        pattern! { (employer: 'y, employee: 'x) isa employment; },
        pattern! { ('x, 'y) isa employment; },
        pattern! { ('x, 'y) isa 't; },
        pattern! { (employee: 'x, 'y); },
        pattern! { ('x, 'y); },
        pattern! { ('x) isa employment; },
        pattern! { ('x, 'y) isa relation; },
    ] {
        let query = common::query(&schema, &query);
        let atom = query.atoms().next().unwrap();

        assert!(atom.is_rule_applicable(&head), "{head} against {atom}");
    }
}

#[test]
fn test_relationship_heads_reject_mismatches() {
    let schema = common::schema();

    let head = common::query(
        &schema,
        &pattern! {
            (employee: 'a, employer: 'b) isa employment;
            'a isa person;
        },
    );
    let head = head.atoms().next().unwrap();

    for query in [
        pattern! { (employer: 'x, employer: 'y) isa employment; },
        pattern! { ('x, 'y, 'z) isa employment; },
        pattern! { ('x, 'y) isa friendship; },
        pattern! { (owner: 'x, 'y); },
        pattern! {
            (employee: 'x, employer: 'y) isa employment;
            'x isa company;
        },
    ] {
        let query = common::query(&schema, &query);
        let atom = query.atoms().next().unwrap();

        assert!(!atom.is_rule_applicable(&head), "{head} against {atom}");
    }
}

#[test]
fn test_ownership_heads_apply_to_implicit_relationships() {
    let schema = common::schema();

    let head = common::query(&schema, &pattern! { 'p has name 'v; 'v == "Alice"; });
    let implicit = common::query(
        &schema,
        &pattern! { ("@has-name-owner": 'x, "@has-name-value": 'n) isa "@has-name"; },
    );

    let head = head.atoms().next().unwrap();
    let implicit = implicit.atoms().next().unwrap();

    assert!(implicit.is_rule_applicable(&head));
    assert!(head.is_rule_applicable(&implicit));
}

#[test]
fn test_applicable_rules_are_selected() {
    let schema = common::schema();

    let rules = [
        InferenceRule::new(
            &schema,
            "colleagues-are-employed",
            &pattern! { 'x isa person; 'y isa company; },
            &pattern! { (employee: 'x, employer: 'y) isa employment; },
        )
        .unwrap(),
        InferenceRule::new(
            &schema,
            "friends-own-pets",
            &pattern! { (friend1: 'x, friend2: 'y) isa friendship; 'z isa pet; },
            &pattern! { (owner: 'x, owned: 'z) isa ownership; },
        )
        .unwrap(),
        InferenceRule::new(
            &schema,
            "everyone-is-named",
            &pattern! { 'x isa person; },
            &pattern! { 'x has name "Alice"; },
        )
        .unwrap(),
    ];

    let query = common::query(
        &schema,
        &pattern! {
            ('x, 'y);
            'x isa person;
            'x has name 'n;
            'n == "Bob";
        },
    );

    let applicable = |atom: AtomRef<'_, '_>| {
        applicable_rules(&atom, &rules)
            .map(|rule| rule.label().to_string())
            .collect::<Vec<_>>()
    };

    let mut atoms = query.atoms();
    let relationship = atoms.next().unwrap();
    let isa = atoms.next().unwrap();
    let resource = atoms.next().unwrap();

    // An untyped relation may also be the implicit ownership of a name.
    assert_eq!(
        applicable(relationship),
        vec!["colleagues-are-employed", "friends-own-pets", "everyone-is-named"]
    );
    assert!(applicable(isa).is_empty());
    assert!(applicable(resource).is_empty());

    let alice = common::query(&schema, &pattern! { 'x has name 'n; 'n == "Alice"; });

    assert_eq!(
        applicable(alice.atoms().next().unwrap()),
        vec!["everyone-is-named"]
    );
}
