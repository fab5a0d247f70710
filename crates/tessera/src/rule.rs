use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
    atom::AtomRef,
    error::{ReasonerError, ReasonerResult},
    id::AtomId,
    label::Label,
    pattern::Conjunction,
    query::ReasonerQuery,
    schema::TypeSystem,
    unification::UnifierType,
    unifier::MultiUnifier,
};

/// A rule concluding a single atom, its head, from a conjunctive body.
#[derive(Debug)]
pub struct InferenceRule<'s> {
    label: Label,
    body: ReasonerQuery<'s>,
    head: ReasonerQuery<'s>,
}

impl<'s> InferenceRule<'s> {
    /// Builds a rule. The head must decompose into exactly one atom.
    pub fn new(
        schema: &'s dyn TypeSystem,
        label: impl Into<Label>,
        body: &Conjunction,
        head: &Conjunction,
    ) -> ReasonerResult<Self> {
        let label = label.into();
        let body = ReasonerQuery::new(schema, body)?;
        let head = ReasonerQuery::new(schema, head)?;

        if head.len() != 1 {
            return Err(ReasonerError::InvalidRule {
                label,
                errors: vec![format!(
                    "the head must contain exactly one atom, found {}",
                    head.len()
                )],
            });
        }

        Ok(Self { label, body, head })
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn body(&self) -> &ReasonerQuery<'s> {
        &self.body
    }

    pub fn head(&self) -> &ReasonerQuery<'s> {
        &self.head
    }

    pub fn head_atom(&self) -> AtomRef<'_, 's> {
        match self.head.atom_ref(AtomId(0)) {
            Some(atom) => atom,
            None => unreachable!("rules are built with exactly one head atom"),
        }
    }

    /// Checks the head and the body against the schema, reporting every problem at once.
    pub fn validate(&self) -> ReasonerResult<()> {
        let head = self.head_atom();

        let mut errors = head.validate_as_rule_head(&self.body);
        errors.extend(head.validate_in_rule());

        for atom in self.body.atoms() {
            errors.extend(atom.validate_in_rule());
        }

        if errors.is_empty() {
            debug!(rule = %self.label, "rule is valid");

            return Ok(());
        }

        warn!(rule = %self.label, count = errors.len(), "rule is invalid");

        Err(ReasonerError::InvalidRule {
            label: self.label.clone(),
            errors: errors.into_iter().collect(),
        })
    }

    /// Whether this rule may produce answers to `atom`.
    pub fn is_applicable_to(&self, atom: &AtomRef<'_, '_>) -> bool {
        atom.is_rule_applicable(&self.head_atom())
    }

    /// Unifiers from the head to `parent`, after naming the head variables `parent` names.
    pub fn unifiers_with(&self, parent: &AtomRef<'_, '_>) -> ReasonerResult<MultiUnifier> {
        let rewritten = self.head_atom().rewrite_to_user_defined(parent);

        self.head.view(&rewritten).unify(parent, UnifierType::Rule)
    }
}

/// The rules that may produce answers to `atom`.
pub fn applicable_rules<'r, 's>(
    atom: &'r AtomRef<'_, '_>,
    rules: &'r [InferenceRule<'s>],
) -> impl Iterator<Item = &'r InferenceRule<'s>> {
    rules.iter().filter(|rule| rule.is_applicable_to(atom))
}

/// Every problem with every rule, keyed by rule label.
pub fn validate_rules(rules: &[InferenceRule<'_>]) -> BTreeSet<(Label, String)> {
    rules
        .iter()
        .filter_map(|rule| match rule.validate() {
            Err(ReasonerError::InvalidRule { label, errors }) => Some((label, errors)),
            _ => None,
        })
        .flat_map(|(label, errors)| errors.into_iter().map(move |error| (label.clone(), error)))
        .collect()
}
