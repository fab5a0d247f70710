use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tessera::{
    answer::Answer,
    label::Label,
    pattern::{Conjunction, Property, RolePlayer, Statement, TypeRef},
    schema::Schema,
    variable::Variable,
    ReasonerQuery, UnifierType,
};

const ROLES: usize = 4;
const PLAYERS: usize = 6;
const ATOMS: usize = 8;
const SEED: u64 = 42;

fn role_label(index: usize) -> String {
    format!("member-{index}")
}

fn generate_schema() -> Schema {
    let mut schema = Schema::new();

    let member = schema.new_entity_type("member").unwrap();
    let roles = (0..ROLES).map(role_label).collect::<Vec<_>>();
    let group = schema
        .new_relation_type("group", &roles.iter().map(String::as_str).collect::<Vec<_>>())
        .unwrap();

    for role in &roles {
        let role = schema.id(role).unwrap();

        schema.plays(member, role).unwrap();
    }

    schema.set_instance_count(group, 1000).unwrap();

    schema
}

/// A conjunction of relationships of random arity, some roles left open.
fn generate_random_pattern(rng: &mut impl Rng) -> Conjunction {
    let players = (0..PLAYERS)
        .map(|index| Variable::named(format!("p{index}")))
        .collect::<Vec<_>>();

    (0..ATOMS)
        .map(|_| {
            let arity = rng.gen_range(2..=ROLES);
            let role_players = players
                .choose_multiple(rng, arity)
                .enumerate()
                .map(|(index, player)| {
                    let role = rng
                        .gen_bool(0.5)
                        .then(|| TypeRef::Label(Label::new(role_label(index))));

                    RolePlayer::new(role, player.clone())
                })
                .collect();

            Statement::new(
                Variable::anonymous(),
                vec![
                    Property::Relation(role_players),
                    Property::Isa {
                        type_ref: TypeRef::Label(Label::new("group")),
                        direct: false,
                    },
                ],
            )
        })
        .collect()
}

fn unify_all(child: &ReasonerQuery<'_>, parent: &ReasonerQuery<'_>) -> usize {
    let child = child.infer_types();
    let parent = parent.infer_types();

    let mut unifiers = 0;

    for child_atom in child.atoms() {
        for parent_atom in parent.atoms() {
            unifiers += child_atom
                .unify(&parent_atom, UnifierType::Rule)
                .map_or(0, |unifiers| unifiers.len());
            unifiers += child_atom.atom_options(&Answer::new()).len();
        }
    }

    unifiers
}

fn random_relationships_benchmark(c: &mut Criterion) {
    let schema = generate_schema();

    c.bench_function("random relationships", |b| {
        b.iter_batched_ref(
            || {
                let mut rng = StdRng::seed_from_u64(SEED);

                let child = ReasonerQuery::new(&schema, &generate_random_pattern(&mut rng)).unwrap();
                let parent = ReasonerQuery::new(&schema, &generate_random_pattern(&mut rng)).unwrap();

                (child, parent)
            },
            |(child, parent)| unify_all(child, parent),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, random_relationships_benchmark);
criterion_main!(benches);
