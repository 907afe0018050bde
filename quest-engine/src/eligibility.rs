//! Eligibility evaluation: does a signal satisfy a quest's condition?

use quest_core::{Condition, Subject};
use serde::{Deserialize, Serialize};

/// Decides whether the acting subject satisfies a quest condition for the
/// signal being processed. Must be pure: the engine may ask more than once
/// per signal (anti-abuse pass and admission).
pub trait EligibilityEvaluator: Send + Sync {
    fn is_eligible(&self, subject: &Subject, condition: &Condition) -> bool;
}

impl<F> EligibilityEvaluator for F
where
    F: Fn(&Subject, &Condition) -> bool + Send + Sync,
{
    fn is_eligible(&self, subject: &Subject, condition: &Condition) -> bool {
        self(subject, condition)
    }
}

/// Accepts every condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlwaysEligible;

impl EligibilityEvaluator for AlwaysEligible {
    fn is_eligible(&self, _subject: &Subject, _condition: &Condition) -> bool {
        true
    }
}

/// Values attached to a signal by its source.
///
/// Root values describe the primary object of the action (e.g. the
/// projectile type). Sub-values carry secondary detail. A condition is
/// matched against both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalContext {
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default)]
    pub sub_values: Vec<String>,
}

impl SignalContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(mut self, value: impl Into<String>) -> Self {
        self.roots.push(value.into());
        self
    }

    pub fn sub(mut self, value: impl Into<String>) -> Self {
        self.sub_values.push(value.into());
        self
    }

    fn values(&self) -> Vec<&str> {
        self.roots
            .iter()
            .chain(self.sub_values.iter())
            .map(String::as_str)
            .collect()
    }
}

impl EligibilityEvaluator for SignalContext {
    fn is_eligible(&self, _subject: &Subject, condition: &Condition) -> bool {
        condition.matches(&self.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn subject() -> Subject {
        Subject::new(Uuid::now_v7(), "survival")
    }

    #[test]
    fn test_unconditional_always_holds() {
        assert!(SignalContext::empty().is_eligible(&subject(), &Condition::Any));
        assert!(AlwaysEligible.is_eligible(&subject(), &Condition::parse("arrow")));
    }

    #[test]
    fn test_root_matches_listed_value() {
        let ctx = SignalContext::empty().root("ARROW");
        assert!(ctx.is_eligible(&subject(), &Condition::parse("arrow,trident")));
        assert!(!ctx.is_eligible(&subject(), &Condition::parse("snowball")));
    }

    #[test]
    fn test_all_of_spans_roots_and_sub_values() {
        let ctx = SignalContext::empty().root("arrow").sub("flame");
        assert!(ctx.is_eligible(&subject(), &Condition::parse("arrow&flame")));
        assert!(!ctx.is_eligible(&subject(), &Condition::parse("arrow&piercing")));
    }

    #[test]
    fn test_closure_evaluator() {
        let only_nether = |s: &Subject, _: &Condition| s.world == "nether";
        assert!(!only_nether.is_eligible(&subject(), &Condition::Any));
        assert!(only_nether.is_eligible(&Subject::new(Uuid::now_v7(), "nether"), &Condition::Any));
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let ctx = SignalContext::empty().root("egg");
        let condition = Condition::parse("egg");
        let s = subject();
        assert_eq!(ctx.is_eligible(&s, &condition), ctx.is_eligible(&s, &condition));
    }
}
