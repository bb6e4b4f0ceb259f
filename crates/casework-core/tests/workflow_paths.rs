//! End-to-end workflow paths through the engine, including the full forward
//! sequence and the rejection short-circuit, with audit-trail validation.

use casework_core::model::{CaseRecord, Role, Stage};
use casework_core::rules::PermissionTable;
use casework_core::session::{Identity, MemorySessionStore, SessionId, SessionStore};
use casework_core::store::MemoryCaseStore;
use casework_core::{WorkflowEngine, WorkflowError};
use chrono::{Duration, Utc};
use std::sync::Arc;

fn engine() -> (WorkflowEngine, Arc<MemorySessionStore>) {
    let sessions = Arc::new(MemorySessionStore::new(Duration::minutes(30)));
    let cases = Arc::new(MemoryCaseStore::new());
    (WorkflowEngine::new(cases, sessions.clone()), sessions)
}

fn login(sessions: &MemorySessionStore, username: &str, role: Role) -> SessionId {
    let identity = Identity {
        username: username.to_string(),
        display_name: username.to_uppercase(),
        team: "fraud-unit".to_string(),
        role,
        all_roles_access: false,
    };
    sessions
        .create(&identity, Utc::now())
        .expect("create session")
        .id
}

/// Every history entry must be a move its actor's role was entitled to make,
/// and consecutive entries must chain (entry N's target is entry N+1's
/// source).
fn assert_history_is_valid_path(case: &CaseRecord) {
    let table = PermissionTable;
    assert_eq!(case.history[0].from_stage, None, "creation entry first");
    assert_eq!(case.history[0].to_stage, Stage::New);

    for window in case.history.windows(2) {
        let (prev, entry) = (&window[0], &window[1]);
        assert_eq!(entry.from_stage, Some(prev.to_stage), "history chains");

        let from = prev.to_stage;
        assert!(!from.is_terminal(), "no transition out of a terminal stage");
        let allowed = if entry.acted_as == Role::Admin {
            table.admin_next_stages(from)
        } else {
            table.allowed_next_stages(from, entry.acted_as)
        };
        assert!(
            allowed.contains(&entry.to_stage),
            "entry {} -> {} by {} not allowed",
            from,
            entry.to_stage,
            entry.acted_as
        );
    }
    assert_eq!(case.history.last().map(|entry| entry.to_stage), Some(case.stage));
}

#[test]
fn full_forward_path_new_to_closed() {
    let (engine, sessions) = engine();
    let now = Utc::now();

    let initiator = login(&sessions, "u1", Role::Initiator);
    let case = engine
        .create_case(
            &initiator,
            serde_json::json!({"category": "loan_fraud"}),
            Some("registered".to_string()),
            now,
        )
        .expect("create");

    let steps: [(&str, Role, Stage); 7] = [
        ("u2", Role::Investigator, Stage::UnderInvestigation),
        ("u2", Role::Investigator, Stage::PendingReview),
        ("u3", Role::Reviewer, Stage::PendingApprovalL1),
        ("u4", Role::ApproverL1, Stage::PendingApprovalL2),
        ("u5", Role::ApproverL2, Stage::PendingLegalReview),
        ("u6", Role::LegalReviewer, Stage::PendingClosure),
        ("u7", Role::Actioner, Stage::Closed),
    ];

    let mut current = case;
    for (username, role, target) in steps {
        let session = login(&sessions, username, role);
        current = engine
            .request_transition(&current.id, &session, target, None, now)
            .expect("forward step");
        assert_eq!(current.stage, target);
    }

    assert_eq!(current.stage, Stage::Closed);
    assert_eq!(current.history.len(), 8);
    assert_history_is_valid_path(&current);
}

/// An end-to-end scenario: create, investigate, attempt a skip, go
/// through review, reject at approval, then verify the case is sealed.
#[test]
fn scenario_skip_denied_then_rejected_seals_case() {
    let (engine, sessions) = engine();
    let now = Utc::now();

    let u1 = login(&sessions, "u1", Role::Initiator);
    let case = engine
        .create_case(&u1, serde_json::json!({}), None, now)
        .expect("create C1");

    let u2 = login(&sessions, "u2", Role::Investigator);
    let moved = engine
        .request_transition(&case.id, &u2, Stage::UnderInvestigation, None, now)
        .expect("u2 starts investigation");
    assert_eq!(moved.history.len(), 2);

    // Reviewer tries to skip PendingReview entirely.
    let u3 = login(&sessions, "u3", Role::Reviewer);
    assert!(matches!(
        engine.request_transition(&case.id, &u3, Stage::PendingApprovalL1, None, now),
        Err(WorkflowError::InvalidTransition {
            from: Stage::UnderInvestigation,
            to: Stage::PendingApprovalL1,
        })
    ));

    let reviewed = engine
        .request_transition(&case.id, &u3, Stage::PendingReview, None, now)
        .expect("u3 pulls into review");
    assert_eq!(reviewed.stage, Stage::PendingReview);

    let u3_again = engine
        .request_transition(&case.id, &u3, Stage::PendingApprovalL1, None, now)
        .expect("u3 forwards for approval");
    assert_eq!(u3_again.stage, Stage::PendingApprovalL1);

    let u4 = login(&sessions, "u4", Role::ApproverL1);
    let rejected = engine
        .request_transition(
            &case.id,
            &u4,
            Stage::Rejected,
            Some("insufficient evidence".to_string()),
            now,
        )
        .expect("u4 rejects");
    assert_eq!(rejected.stage, Stage::Rejected);
    assert_history_is_valid_path(&rejected);

    // Terminal: every further attempt fails, from any role.
    for (username, role) in [
        ("u2", Role::Investigator),
        ("u3", Role::Reviewer),
        ("u4", Role::ApproverL1),
    ] {
        let session = login(&sessions, username, role);
        for target in [Stage::UnderInvestigation, Stage::PendingReview, Stage::Closed] {
            assert!(matches!(
                engine.request_transition(&case.id, &session, target, None, now),
                Err(WorkflowError::InvalidTransition {
                    from: Stage::Rejected,
                    ..
                })
            ));
        }
    }

    let fresh = engine.show_case(&case.id, &u1, now).expect("show");
    assert_eq!(fresh.stage, Stage::Rejected);
    assert_eq!(fresh.history.len(), 5);
}

#[test]
fn legal_reviewer_rejects_late_in_the_flow() {
    let (engine, sessions) = engine();
    let now = Utc::now();

    let u1 = login(&sessions, "u1", Role::Initiator);
    let case = engine
        .create_case(&u1, serde_json::json!({}), None, now)
        .expect("create");

    for (username, role, target) in [
        ("u2", Role::Investigator, Stage::UnderInvestigation),
        ("u2", Role::Investigator, Stage::PendingReview),
        ("u3", Role::Reviewer, Stage::PendingApprovalL1),
        ("u4", Role::ApproverL1, Stage::PendingApprovalL2),
        ("u5", Role::ApproverL2, Stage::PendingLegalReview),
    ] {
        let session = login(&sessions, username, role);
        engine
            .request_transition(&case.id, &session, target, None, now)
            .expect("forward step");
    }

    let u6 = login(&sessions, "u6", Role::LegalReviewer);
    let rejected = engine
        .request_transition(
            &case.id,
            &u6,
            Stage::Rejected,
            Some("legal bar not met".to_string()),
            now,
        )
        .expect("legal rejects");
    assert_eq!(rejected.stage, Stage::Rejected);
    assert_history_is_valid_path(&rejected);
}
