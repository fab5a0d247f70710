mod common;

use std::collections::BTreeSet;

use common::var;
use pretty_assertions::assert_eq;
use tessera::{
    label::Label,
    pattern,
    rule::validate_rules,
    InferenceRule, ReasonerError, ReasonerQuery, UnifierType,
};

#[test]
fn test_head_must_be_a_single_atom() {
    let schema = common::schema();

    let rule = InferenceRule::new(
        &schema,
        "two-heads",
        &pattern! { 'x isa person; },
        &pattern! { 'x isa person; 'y isa company; },
    );

    assert_eq!(
        rule.unwrap_err(),
        ReasonerError::InvalidRule {
            label: Label::new("two-heads"),
            errors: vec!["the head must contain exactly one atom, found 2".to_owned()],
        }
    );
}

#[test]
fn test_valid_rule() {
    let schema = common::schema();

    let rule = InferenceRule::new(
        &schema,
        "colleagues",
        &pattern! { 'x isa person; 'y isa company; },
        &pattern! { (employee: 'x, employer: 'y) isa employment; },
    )
    .unwrap();

    assert_eq!(rule.label(), &Label::new("colleagues"));
    assert_eq!(rule.body().len(), 2);
    assert_eq!(rule.validate(), Ok(()));
}

#[test]
fn test_head_roles_must_be_explicit() {
    let schema = common::schema();

    let rule = InferenceRule::new(
        &schema,
        "half-friends",
        &pattern! { 'x isa person; 'y isa person; },
        &pattern! { 'f (friend1: 'x, 'y) isa friendship; },
    )
    .unwrap();

    assert_eq!(
        rule.validate(),
        Err(ReasonerError::InvalidRule {
            label: Label::new("half-friends"),
            errors: vec![
                "role player $y of rule head `$f (friend1: $x, $y) isa friendship;` has no explicit role"
                    .to_owned()
            ],
        })
    );
}

#[test]
fn test_head_attribute_must_be_bound() {
    let schema = common::schema();

    let unbound = InferenceRule::new(
        &schema,
        "unbound-name",
        &pattern! { 'x isa person; },
        &pattern! { 'x has name 'n; },
    )
    .unwrap();
    let bound = InferenceRule::new(
        &schema,
        "bound-name",
        &pattern! { 'x isa person; 'y has name 'n; },
        &pattern! { 'x has name 'n; },
    )
    .unwrap();
    let valued = InferenceRule::new(
        &schema,
        "valued-name",
        &pattern! { 'x isa person; },
        &pattern! { 'x has name "Alice"; },
    )
    .unwrap();

    assert_eq!(
        unbound.validate(),
        Err(ReasonerError::InvalidRule {
            label: Label::new("unbound-name"),
            errors: vec![
                "attribute $n of rule head `$x has name $n;` is neither given a value nor bound in the body"
                    .to_owned()
            ],
        })
    );
    assert_eq!(bound.validate(), Ok(()));
    assert_eq!(valued.validate(), Ok(()));
}

#[test]
fn test_invalid_heads() {
    let schema = common::schema();

    let invalid = [
        (
            pattern! { 't sub entity; },
            "schema atom `$t sub entity;` cannot be the head of a rule",
        ),
        (
            pattern! { ('x, 'y); },
            "role player $x of rule head `$_ ($x, $y);` has no explicit role",
        ),
        (
            pattern! { 'x isa entity; },
            "rule head `$x isa entity;` uses the meta type `entity`",
        ),
        (
            pattern! { 'x has age > 5; },
            "rule head `$x has age $_;` constrains its attribute with `> 5` instead of assigning a value",
        ),
    ];

    for (head, expected) in invalid {
        let rule = InferenceRule::new(&schema, "invalid", &pattern! { 'x isa person; }, &head)
            .unwrap();

        let Err(ReasonerError::InvalidRule { errors, .. }) = rule.validate() else {
            panic!("{head} was accepted as a rule head");
        };

        // Anonymous variables render with a generated index.
        let (prefix, suffix) = expected.split_once("$_").unwrap_or((expected, ""));

        assert!(
            errors
                .iter()
                .any(|error| error.starts_with(prefix) && error.ends_with(suffix)),
            "{errors:?} does not report {expected:?}"
        );
    }
}

#[test]
fn test_body_is_checked_against_the_schema() {
    let schema = common::schema();

    let rule = InferenceRule::new(
        &schema,
        "companies-work",
        &pattern! {
            (employee: 'x, employer: 'y) isa employment;
            'x isa company;
        },
        &pattern! { (owner: 'y, owned: 'x) isa ownership; },
    )
    .unwrap();

    assert_eq!(
        rule.validate(),
        Err(ReasonerError::InvalidRule {
            label: Label::new("companies-work"),
            errors: vec!["type `company` cannot play the role `employee`".to_owned()],
        })
    );
}

#[test]
fn test_validate_rules_collects_every_problem() {
    let schema = common::schema();

    let rules = [
        InferenceRule::new(
            &schema,
            "valid",
            &pattern! { 'x isa person; 'y isa company; },
            &pattern! { (employee: 'x, employer: 'y) isa employment; },
        )
        .unwrap(),
        InferenceRule::new(
            &schema,
            "unbound-name",
            &pattern! { 'x isa person; },
            &pattern! { 'x has name 'n; },
        )
        .unwrap(),
        InferenceRule::new(
            &schema,
            "pets-own-pets",
            &pattern! { 'x isa pet; 'y isa pet; },
            &pattern! {
                (owner: 'x, friend1: 'y) isa ownership;
            },
        )
        .unwrap(),
    ];

    let errors = validate_rules(&rules);

    assert_eq!(
        errors,
        BTreeSet::from([
            (
                Label::new("pets-own-pets"),
                "relation type `ownership` does not relate the role `friend1`".to_owned()
            ),
            (
                Label::new("unbound-name"),
                "attribute $n of rule head `$x has name $n;` is neither given a value nor bound in the body"
                    .to_owned()
            ),
        ])
    );
}

#[test]
fn test_rule_unifies_with_query_atoms() {
    let schema = common::schema();

    let rule = InferenceRule::new(
        &schema,
        "colleagues",
        &pattern! { 'x isa person; 'y isa company; },
        &pattern! { (employee: 'x, employer: 'y) isa employment; },
    )
    .unwrap();

    let query = ReasonerQuery::new(
        &schema,
        &pattern! { 'r (employee: 'a, employer: 'b) isa employment; },
    )
    .unwrap();
    let atom = query.atoms().next().unwrap();

    assert!(rule.is_applicable_to(&atom));

    let unifiers = rule.unifiers_with(&atom).unwrap();
    let unifier = unifiers.unifier().unwrap();

    assert!(unifier.contains(&var("x"), &var("a")));
    assert!(unifier.contains(&var("y"), &var("b")));
    assert!(unifier.values().any(|parent| parent == &var("r")));
    assert_eq!(unifier.len(), 3);

    // Without a relation variable in the query there is nothing to map the head's to.
    let unnamed = ReasonerQuery::new(
        &schema,
        &pattern! { (employee: 'a, employer: 'b) isa employment; },
    )
    .unwrap();
    let unnamed = unnamed.atoms().next().unwrap();

    assert_eq!(
        rule.unifiers_with(&unnamed).unwrap().unifier().map(|unifier| unifier.len()),
        Some(2)
    );
    assert!(!rule.head_atom().unify(&unnamed, UnifierType::Exact).unwrap().is_empty());
}
