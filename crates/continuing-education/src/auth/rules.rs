use crate::admissions::domain::Admission;
use crate::admissions::state::AdmissionState;

use super::identity::{Group, User};

/// Record a permission is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Model-level check with no record.
    Nothing,
    /// A record about to be created.
    New,
    /// A persisted admission.
    Admission(&'a Admission),
}

/// Inputs of a single rule evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub user: &'a User,
    pub target: Target<'a>,
}

/// Boolean expression over primitive checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Always,
    Never,
    InGroup(Group),
    AdmissionInState(AdmissionState),
    NewInstance,
    And(Box<Rule>, Box<Rule>),
    Or(Box<Rule>, Box<Rule>),
    Not(Box<Rule>),
}

impl Rule {
    pub fn and(self, other: Rule) -> Rule {
        Rule::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Rule) -> Rule {
        Rule::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Rule {
        Rule::Not(Box::new(self))
    }

    /// Pure evaluation; record predicates are false when the target is not an
    /// admission.
    pub fn evaluate(&self, context: &RuleContext<'_>) -> bool {
        match self {
            Rule::Always => true,
            Rule::Never => false,
            Rule::InGroup(group) => context.user.in_group(*group),
            Rule::AdmissionInState(state) => match context.target {
                Target::Admission(admission) => admission.state == *state,
                Target::Nothing | Target::New => false,
            },
            Rule::NewInstance => matches!(context.target, Target::New),
            Rule::And(left, right) => left.evaluate(context) && right.evaluate(context),
            Rule::Or(left, right) => left.evaluate(context) || right.evaluate(context),
            Rule::Not(inner) => !inner.evaluate(context),
        }
    }
}

pub fn is_training_manager() -> Rule {
    Rule::InGroup(Group::TrainingManagers)
}

pub fn is_admission_draft() -> Rule {
    Rule::AdmissionInState(AdmissionState::Draft)
}

pub fn is_registration_submitted() -> Rule {
    Rule::AdmissionInState(AdmissionState::RegistrationSubmitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissions::tests::common::admission_in_state;

    fn manager() -> User {
        User::with_groups("manager", &[Group::TrainingManagers])
    }

    #[test]
    fn composition_follows_boolean_algebra() {
        let rule = is_training_manager().and(is_admission_draft().negate());
        let submitted = admission_in_state(AdmissionState::Submitted);
        let draft = admission_in_state(AdmissionState::Draft);
        let user = manager();

        assert!(rule.evaluate(&RuleContext {
            user: &user,
            target: Target::Admission(&submitted),
        }));
        assert!(!rule.evaluate(&RuleContext {
            user: &user,
            target: Target::Admission(&draft),
        }));
    }

    #[test]
    fn record_predicates_need_an_admission() {
        let user = manager();
        let context = RuleContext {
            user: &user,
            target: Target::Nothing,
        };
        assert!(!is_admission_draft().evaluate(&context));
        assert!(is_admission_draft().negate().evaluate(&context));
        assert!(!Rule::NewInstance.evaluate(&context));
    }

    #[test]
    fn novelty_or_group_membership() {
        let outsider = User::new("outsider", Vec::<String>::new());
        let rule = Rule::NewInstance.or(is_training_manager());

        assert!(rule.evaluate(&RuleContext {
            user: &outsider,
            target: Target::New,
        }));
        let accepted = admission_in_state(AdmissionState::Accepted);
        assert!(!rule.evaluate(&RuleContext {
            user: &outsider,
            target: Target::Admission(&accepted),
        }));
    }
}
