//! Step rule evaluation
//!
//! Every rule looks at the responses collected on the current step and gives
//! a [`Verdict`]. A [`StepPolicy`] combines its rules with the precedence
//! `Reject > Finish > Continue > Pending`:
//! - any rule rejecting rejects the document
//! - any rule finishing approves the whole process
//! - the step continues once every completion rule is satisfied
//!
//! `AutoReject` and `CanFinish` are overrides: they never complete a step on
//! their own. A policy without completion rules behaves as `AllRequired`.

use pir_model::{Decision, Response, StepPolicy, StepRule, Verdict};

/// Responses gathered on one step, with the expected participant count
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    participants: &'a [String],
    responses: &'a [Response],
}

impl<'a> StepContext<'a> {
    /// Context over `responses` for `participants`
    ///
    /// An empty participant list marks an open step. Anyone may answer, so
    /// more responses can always arrive: `AllRequired` counts the
    /// respondents so far, while `AnyApproves` and `Quorum` never reject for
    /// lack of remaining participants.
    #[must_use]
    pub fn new(participants: &'a [String], responses: &'a [Response]) -> Self {
        Self {
            participants,
            responses,
        }
    }

    fn is_open(&self) -> bool {
        self.participants.is_empty()
    }

    fn expected(&self) -> usize {
        if self.is_open() {
            self.responses.len()
        } else {
            self.participants.len()
        }
    }

    fn count(&self, decision: Decision) -> usize {
        self.responses
            .iter()
            .filter(|r| r.decision == decision)
            .count()
    }

    fn approvals(&self) -> usize {
        self.count(Decision::Approve)
    }

    fn rejections(&self) -> usize {
        self.count(Decision::Reject)
    }

    /// Participants still to answer; `None` when the step is open
    fn outstanding(&self) -> Option<usize> {
        if self.is_open() {
            None
        } else {
            Some(self.participants.len().saturating_sub(self.responses.len()))
        }
    }

    fn approved_by(&self, participant: &str) -> bool {
        self.responses
            .iter()
            .any(|r| r.participant == participant && r.decision == Decision::Approve)
    }
}

/// Something that can judge a step from its responses
pub trait RuleEvaluator {
    /// Verdict for the current responses
    fn evaluate(&self, ctx: &StepContext<'_>) -> Verdict;
}

impl RuleEvaluator for StepRule {
    fn evaluate(&self, ctx: &StepContext<'_>) -> Verdict {
        match self {
            StepRule::AllRequired => {
                if ctx.rejections() > 0 {
                    Verdict::Reject
                } else if ctx.approvals() == ctx.expected() {
                    Verdict::Continue
                } else {
                    Verdict::Pending
                }
            }
            StepRule::AnyApproves => {
                if ctx.approvals() > 0 {
                    Verdict::Continue
                } else if ctx.outstanding() == Some(0) && ctx.rejections() > 0 {
                    Verdict::Reject
                } else {
                    Verdict::Pending
                }
            }
            StepRule::Quorum { approvals } => {
                let needed = *approvals as usize;
                if ctx.approvals() >= needed {
                    Verdict::Continue
                } else if ctx
                    .outstanding()
                    .is_some_and(|left| ctx.approvals() + left < needed)
                {
                    Verdict::Reject
                } else {
                    Verdict::Pending
                }
            }
            StepRule::AutoReject => {
                if ctx.rejections() > 0 {
                    Verdict::Reject
                } else {
                    Verdict::Pending
                }
            }
            StepRule::CanFinish { participant } => {
                if ctx.approved_by(participant) {
                    Verdict::Finish
                } else {
                    Verdict::Pending
                }
            }
        }
    }
}

impl RuleEvaluator for StepPolicy {
    fn evaluate(&self, ctx: &StepContext<'_>) -> Verdict {
        let verdicts: Vec<Verdict> = self.rules.iter().map(|r| r.evaluate(ctx)).collect();

        if verdicts.contains(&Verdict::Reject) {
            return Verdict::Reject;
        }
        if verdicts.contains(&Verdict::Finish) {
            return Verdict::Finish;
        }

        let mut completion = self
            .rules
            .iter()
            .zip(&verdicts)
            .filter(|(rule, _)| rule.is_completion_rule())
            .map(|(_, v)| *v)
            .peekable();

        if completion.peek().is_none() {
            return StepRule::AllRequired.evaluate(ctx);
        }
        if completion.all(|v| v == Verdict::Continue) {
            Verdict::Continue
        } else {
            Verdict::Pending
        }
    }
}

/// Verdict for a step without a configured policy
///
/// The plain linear chain: an approval moves on, a rejection rejects.
#[must_use]
pub fn linear_verdict(decision: Decision) -> Verdict {
    match decision {
        Decision::Approve => Verdict::Continue,
        Decision::Reject => Verdict::Reject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn eval(rules: Vec<StepRule>, participants: &[&str], responses: &[Response]) -> Verdict {
        let policy = StepPolicy::new(people(participants), rules);
        let ctx = StepContext::new(&policy.participants, responses);
        policy.evaluate(&ctx)
    }

    #[test]
    fn all_required_waits_for_everyone() {
        let rules = vec![StepRule::AllRequired];
        assert_eq!(
            eval(rules.clone(), &["a", "b"], &[Response::approve("a")]),
            Verdict::Pending
        );
        assert_eq!(
            eval(rules, &["a", "b"], &[Response::approve("a"), Response::approve("b")]),
            Verdict::Continue
        );
    }

    #[test]
    fn all_required_rejects_on_any_rejection() {
        assert_eq!(
            eval(vec![StepRule::AllRequired], &["a", "b"], &[Response::reject("b")]),
            Verdict::Reject
        );
    }

    #[test]
    fn any_approves_continues_on_first_approval() {
        let rules = vec![StepRule::AnyApproves];
        assert_eq!(
            eval(rules.clone(), &["a", "b"], &[Response::reject("a")]),
            Verdict::Pending
        );
        assert_eq!(
            eval(rules.clone(), &["a", "b"], &[Response::reject("a"), Response::approve("b")]),
            Verdict::Continue
        );
        assert_eq!(
            eval(rules, &["a", "b"], &[Response::reject("a"), Response::reject("b")]),
            Verdict::Reject
        );
    }

    #[test]
    fn quorum_rejects_when_unreachable() {
        let rules = vec![StepRule::Quorum { approvals: 2 }];
        let participants = ["a", "b", "c"];
        assert_eq!(
            eval(rules.clone(), &participants, &[Response::reject("a")]),
            Verdict::Pending
        );
        assert_eq!(
            eval(rules.clone(), &participants, &[Response::reject("a"), Response::reject("b")]),
            Verdict::Reject
        );
        assert_eq!(
            eval(rules, &participants, &[Response::approve("a"), Response::approve("c")]),
            Verdict::Continue
        );
    }

    #[test]
    fn auto_reject_overrides_any_approves() {
        let rules = vec![StepRule::AnyApproves, StepRule::AutoReject];
        assert_eq!(
            eval(rules, &["a", "b"], &[Response::approve("a"), Response::reject("b")]),
            Verdict::Reject
        );
    }

    #[test]
    fn can_finish_short_circuits() {
        let rules = vec![
            StepRule::AllRequired,
            StepRule::CanFinish {
                participant: "chief".into(),
            },
        ];
        assert_eq!(
            eval(rules, &["chief", "a", "b"], &[Response::approve("chief")]),
            Verdict::Finish
        );
    }

    #[test]
    fn overrides_alone_fall_back_to_all_required() {
        let rules = vec![StepRule::AutoReject];
        assert_eq!(
            eval(rules.clone(), &["a", "b"], &[Response::approve("a")]),
            Verdict::Pending
        );
        assert_eq!(
            eval(rules, &["a", "b"], &[Response::approve("a"), Response::approve("b")]),
            Verdict::Continue
        );
    }

    #[test]
    fn open_step_counts_respondents() {
        assert_eq!(
            eval(vec![StepRule::AllRequired], &[], &[Response::approve("anyone")]),
            Verdict::Continue
        );
    }

    #[test]
    fn open_quorum_waits_for_more_responses() {
        let rules = vec![StepRule::Quorum { approvals: 2 }];
        assert_eq!(eval(rules.clone(), &[], &[Response::approve("a")]), Verdict::Pending);
        assert_eq!(
            eval(rules.clone(), &[], &[Response::reject("a"), Response::reject("b")]),
            Verdict::Pending
        );
        assert_eq!(
            eval(rules, &[], &[Response::approve("a"), Response::approve("b")]),
            Verdict::Continue
        );
    }

    #[test]
    fn open_any_approves_never_rejects_alone() {
        let rules = vec![StepRule::AnyApproves];
        assert_eq!(eval(rules.clone(), &[], &[Response::reject("a")]), Verdict::Pending);
        assert_eq!(
            eval(rules, &[], &[Response::reject("a"), Response::approve("b")]),
            Verdict::Continue
        );
        assert_eq!(
            eval(
                vec![StepRule::AnyApproves, StepRule::AutoReject],
                &[],
                &[Response::reject("a")]
            ),
            Verdict::Reject
        );
    }

    #[test]
    fn linear_verdicts() {
        assert_eq!(linear_verdict(Decision::Approve), Verdict::Continue);
        assert_eq!(linear_verdict(Decision::Reject), Verdict::Reject);
    }
}
