use pir_model::DocumentStatus;
use pir_workflow::state_machine::{allowed_transitions, validate_transition};
use proptest::prelude::*;

#[test]
fn test_draft_transitions() {
    assert!(validate_transition(DocumentStatus::Draft, DocumentStatus::OnApproval).is_ok());

    // Invalid
    assert!(validate_transition(DocumentStatus::Draft, DocumentStatus::Approved).is_err());
    assert!(validate_transition(DocumentStatus::Draft, DocumentStatus::Rejected).is_err());
}

#[test]
fn test_terminal_states_only_restart() {
    for terminal in [DocumentStatus::Approved, DocumentStatus::Rejected] {
        assert_eq!(allowed_transitions(terminal), vec![DocumentStatus::OnApproval]);
        assert!(validate_transition(terminal, DocumentStatus::Draft).is_err());
    }
}

fn arb_status() -> impl Strategy<Value = DocumentStatus> {
    prop::sample::select(DocumentStatus::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_validation_matches_allowed(from in arb_status(), to in arb_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_nothing_returns_to_draft(from in arb_status()) {
        prop_assert!(validate_transition(from, DocumentStatus::Draft).is_err());
    }

    #[test]
    fn prop_every_status_can_start_a_run(from in arb_status()) {
        prop_assert!(validate_transition(from, DocumentStatus::OnApproval).is_ok());
    }
}
