//! The workflow engine: the one place a case's stage changes.
//!
//! Every operation takes an explicit session id and an explicit `now`; the
//! engine holds no ambient identity or clock state. The call sequence for a
//! transition is fixed: validate the session (refreshing its activity),
//! load the case, check the permission table against the session's *active*
//! role, then apply the move through the store's compare-and-swap. A stale
//! read loses with `StageConflict` and writes nothing.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::WorkflowError;
use crate::model::case::{AuditEntry, CaseId, CaseRecord};
use crate::model::role::Role;
use crate::model::stage::Stage;
use crate::rules::PermissionTable;
use crate::session::{Session, SessionId, SessionStore};
use crate::store::CaseStore;

/// After a forward move the case belongs to the role that owns the next
/// step; a rejected case goes back to its initiator's queue for follow-up.
const fn owning_role(stage: Stage) -> Role {
    match stage {
        Stage::New => Role::Initiator,
        Stage::UnderInvestigation => Role::Investigator,
        Stage::PendingReview => Role::Reviewer,
        Stage::PendingApprovalL1 => Role::ApproverL1,
        Stage::PendingApprovalL2 => Role::ApproverL2,
        Stage::PendingLegalReview => Role::LegalReviewer,
        Stage::PendingClosure => Role::Actioner,
        Stage::Closed | Stage::Rejected => Role::Initiator,
    }
}

/// The engine over pluggable case and session stores.
pub struct WorkflowEngine {
    cases: Arc<dyn CaseStore>,
    sessions: Arc<dyn SessionStore>,
    rules: PermissionTable,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(cases: Arc<dyn CaseStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            cases,
            sessions,
            rules: PermissionTable,
        }
    }

    /// The permission table, for callers that want to render what an actor
    /// could do next without attempting it.
    #[must_use]
    pub const fn rules(&self) -> PermissionTable {
        self.rules
    }

    /// Validate and refresh the caller's session. Every engine entry point
    /// funnels through here, so any authenticated request counts as
    /// activity regardless of whether the action itself is later denied.
    fn authenticated(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, WorkflowError> {
        let session = self.sessions.validate(session_id, now)?;
        self.sessions.touch(session_id, now)?;
        Ok(session)
    }

    /// Open a new case at stage `New`. Initiator-owned; Admin may override.
    ///
    /// # Errors
    ///
    /// `SessionExpired`/`SessionNotFound` for a dead session, `Unauthorized`
    /// for roles other than Initiator/Admin, `Storage` if the write fails.
    pub fn create_case(
        &self,
        session_id: &SessionId,
        payload: serde_json::Value,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CaseRecord, WorkflowError> {
        let session = self.authenticated(session_id, now)?;
        if !session.active_role.may_create_cases() {
            warn!(
                actor = %session.username,
                role = %session.active_role,
                "denied case creation"
            );
            return Err(WorkflowError::Unauthorized {
                stage: Stage::New,
                role: session.active_role,
            });
        }

        let record = CaseRecord::open(
            session.username.clone(),
            session.active_role,
            payload,
            comment,
            now,
        );
        self.cases.create(&record)?;
        info!(case = %record.id, actor = %session.username, "case registered");
        Ok(record)
    }

    /// Request a stage transition on an existing case.
    ///
    /// # Errors
    ///
    /// `SessionExpired`, `CaseNotFound`,
    /// `Unauthorized` (role has no row for the stage), `InvalidTransition`
    /// (terminal case, or a target the role's row does not allow), and
    /// `StageConflict` when another actor got there first.
    pub fn request_transition(
        &self,
        case_id: &CaseId,
        session_id: &SessionId,
        to_stage: Stage,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CaseRecord, WorkflowError> {
        let session = self.authenticated(session_id, now)?;
        let case = self.cases.load(case_id)?;

        self.authorize(&case, &session, to_stage)?;

        let audit = AuditEntry {
            actor: session.username.clone(),
            acted_as: session.active_role,
            from_stage: Some(case.stage),
            to_stage,
            at: now,
            comment,
        };
        self.cases
            .compare_and_swap_stage(case_id, case.stage, owning_role(to_stage), &audit)?;

        info!(
            case = %case_id,
            actor = %session.username,
            role = %session.active_role,
            from = %case.stage,
            to = %to_stage,
            "transition applied"
        );
        self.cases.load(case_id)
    }

    /// Check the permission table for one requested move.
    ///
    /// Admin bypasses the role check but not stage order: its reach from a
    /// stage is the union of every role's rows there, and nothing leaves a
    /// terminal stage.
    fn authorize(
        &self,
        case: &CaseRecord,
        session: &Session,
        to_stage: Stage,
    ) -> Result<(), WorkflowError> {
        let role = session.active_role;

        if case.stage.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                from: case.stage,
                to: to_stage,
            });
        }

        let allowed = if role == Role::Admin {
            self.rules.admin_next_stages(case.stage)
        } else {
            self.rules.allowed_next_stages(case.stage, role)
        };

        if allowed.is_empty() {
            warn!(
                case = %case.id,
                actor = %session.username,
                role = %role,
                stage = %case.stage,
                "unauthorized transition attempt"
            );
            return Err(WorkflowError::Unauthorized {
                stage: case.stage,
                role,
            });
        }
        if !allowed.contains(&to_stage) {
            return Err(WorkflowError::InvalidTransition {
                from: case.stage,
                to: to_stage,
            });
        }
        Ok(())
    }

    /// Switch the session's active role (capability-gated; see
    /// [`Session::check_role_switch`]).
    ///
    /// # Errors
    ///
    /// `SessionExpired`/`SessionNotFound` for a dead session,
    /// `RoleSwitchDenied` when the capability checks fail.
    pub fn switch_active_role(
        &self,
        session_id: &SessionId,
        new_role: Role,
        now: DateTime<Utc>,
    ) -> Result<Session, WorkflowError> {
        let session = self.authenticated(session_id, now)?;
        let switched = self.sessions.switch_active_role(session_id, new_role)?;
        info!(
            actor = %session.username,
            from = %session.active_role,
            to = %new_role,
            "active role switched"
        );
        Ok(switched)
    }

    /// Load a case for display. Requires a live session but no particular
    /// role; viewing is not a transition.
    ///
    /// # Errors
    ///
    /// Session errors as above, `CaseNotFound` for an unknown id.
    pub fn show_case(
        &self,
        case_id: &CaseId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<CaseRecord, WorkflowError> {
        self.authenticated(session_id, now)?;
        self.cases.load(case_id)
    }

    /// List cases, optionally filtered by stage, for dashboards and queues.
    ///
    /// # Errors
    ///
    /// Session errors as above, `Storage` on read failure.
    pub fn list_cases(
        &self,
        session_id: &SessionId,
        stage: Option<Stage>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CaseRecord>, WorkflowError> {
        self.authenticated(session_id, now)?;
        self.cases.list(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::{WorkflowEngine, owning_role};
    use crate::error::WorkflowError;
    use crate::model::role::Role;
    use crate::model::stage::Stage;
    use crate::session::{Identity, MemorySessionStore, SessionId, SessionStore};
    use crate::store::MemoryCaseStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn engine() -> (WorkflowEngine, Arc<MemorySessionStore>) {
        let sessions = Arc::new(MemorySessionStore::new(Duration::minutes(30)));
        let cases = Arc::new(MemoryCaseStore::new());
        (WorkflowEngine::new(cases, sessions.clone()), sessions)
    }

    fn login(
        sessions: &MemorySessionStore,
        username: &str,
        role: Role,
        all_roles: bool,
    ) -> SessionId {
        let identity = Identity {
            username: username.to_string(),
            display_name: username.to_uppercase(),
            team: "fraud-unit".to_string(),
            role,
            all_roles_access: all_roles,
        };
        sessions
            .create(&identity, Utc::now())
            .expect("create session")
            .id
    }

    #[test]
    fn initiator_creates_investigator_cannot() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let case = engine
            .create_case(&initiator, serde_json::json!({}), None, now)
            .expect("create case");
        assert_eq!(case.stage, Stage::New);

        let investigator = login(&sessions, "u2", Role::Investigator, false);
        assert!(matches!(
            engine.create_case(&investigator, serde_json::json!({}), None, now),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn transition_checks_role_then_target() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let case = engine
            .create_case(&initiator, serde_json::json!({}), None, now)
            .expect("create case");

        // Initiator has no row for New at all.
        assert!(matches!(
            engine.request_transition(&case.id, &initiator, Stage::UnderInvestigation, None, now),
            Err(WorkflowError::Unauthorized {
                stage: Stage::New,
                role: Role::Initiator,
            })
        ));

        // Investigator has a row, but not to this target.
        let investigator = login(&sessions, "u2", Role::Investigator, false);
        assert!(matches!(
            engine.request_transition(&case.id, &investigator, Stage::PendingReview, None, now),
            Err(WorkflowError::InvalidTransition {
                from: Stage::New,
                to: Stage::PendingReview,
            })
        ));

        let moved = engine
            .request_transition(
                &case.id,
                &investigator,
                Stage::UnderInvestigation,
                Some("taking it".to_string()),
                now,
            )
            .expect("valid transition");
        assert_eq!(moved.stage, Stage::UnderInvestigation);
        assert_eq!(moved.assigned_role, Role::Investigator);
        assert_eq!(moved.history.len(), 2);
    }

    #[test]
    fn expired_session_is_rejected_before_anything_else() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let later = now + Duration::minutes(31);
        assert!(matches!(
            engine.create_case(&initiator, serde_json::json!({}), None, later),
            Err(WorkflowError::SessionExpired)
        ));
    }

    #[test]
    fn requests_refresh_activity() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let near_timeout = now + Duration::minutes(29);
        engine
            .list_cases(&initiator, None, near_timeout)
            .expect("list refreshes activity");

        // 31 minutes after login but only 2 after the last request.
        let after = now + Duration::minutes(31);
        assert!(engine.list_cases(&initiator, None, after).is_ok());
    }

    #[test]
    fn initiator_and_investigator_cannot_reject() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let case = engine
            .create_case(&initiator, serde_json::json!({}), None, now)
            .expect("create case");

        let investigator = login(&sessions, "u2", Role::Investigator, false);
        assert!(matches!(
            engine.request_transition(&case.id, &investigator, Stage::Rejected, None, now),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn reviewer_rejects_from_early_stage() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let case = engine
            .create_case(&initiator, serde_json::json!({}), None, now)
            .expect("create case");

        let reviewer = login(&sessions, "u3", Role::Reviewer, false);
        let rejected = engine
            .request_transition(
                &case.id,
                &reviewer,
                Stage::Rejected,
                Some("duplicate filing".to_string()),
                now,
            )
            .expect("reject from New");
        assert_eq!(rejected.stage, Stage::Rejected);
    }

    #[test]
    fn terminal_case_accepts_nothing_further() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let initiator = login(&sessions, "u1", Role::Initiator, false);
        let case = engine
            .create_case(&initiator, serde_json::json!({}), None, now)
            .expect("create case");

        let reviewer = login(&sessions, "u3", Role::Reviewer, false);
        engine
            .request_transition(&case.id, &reviewer, Stage::Rejected, None, now)
            .expect("reject");

        for target in [Stage::New, Stage::UnderInvestigation, Stage::Closed] {
            assert!(matches!(
                engine.request_transition(&case.id, &reviewer, target, None, now),
                Err(WorkflowError::InvalidTransition {
                    from: Stage::Rejected,
                    ..
                })
            ));
        }
    }

    #[test]
    fn admin_bypasses_role_but_not_stage_order() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let admin = login(&sessions, "root", Role::Admin, true);
        let case = engine
            .create_case(&admin, serde_json::json!({}), None, now)
            .expect("admin creates");

        // Admin may perform the investigator's step without switching roles.
        let moved = engine
            .request_transition(&case.id, &admin, Stage::UnderInvestigation, None, now)
            .expect("admin forward move");
        assert_eq!(moved.stage, Stage::UnderInvestigation);

        // But stage order still binds: no jumping straight to approval.
        assert!(matches!(
            engine.request_transition(&case.id, &admin, Stage::PendingApprovalL1, None, now),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn admin_acting_as_role_is_evaluated_as_that_role() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let admin = login(&sessions, "root", Role::Admin, true);
        let case = engine
            .create_case(&admin, serde_json::json!({}), None, now)
            .expect("admin creates");

        engine
            .switch_active_role(&admin, Role::Actioner, now)
            .expect("switch to actioner");

        // Actioner holds no row for New, so the impersonating admin is
        // denied exactly as a real actioner would be.
        assert!(matches!(
            engine.request_transition(&case.id, &admin, Stage::UnderInvestigation, None, now),
            Err(WorkflowError::Unauthorized {
                stage: Stage::New,
                role: Role::Actioner,
            })
        ));
    }

    #[test]
    fn switch_requires_capability() {
        let (engine, sessions) = engine();
        let now = Utc::now();

        let reviewer = login(&sessions, "u3", Role::Reviewer, false);
        assert!(matches!(
            engine.switch_active_role(&reviewer, Role::Investigator, now),
            Err(WorkflowError::RoleSwitchDenied { .. })
        ));
    }

    #[test]
    fn unknown_case_is_not_found() {
        let (engine, sessions) = engine();
        let now = Utc::now();
        let initiator = login(&sessions, "u1", Role::Initiator, false);
        assert!(matches!(
            engine.show_case(&crate::model::case::CaseId::new("case-missing"), &initiator, now),
            Err(WorkflowError::CaseNotFound(_))
        ));
    }

    #[test]
    fn rejected_and_closed_cases_return_to_initiator_queue() {
        assert_eq!(owning_role(Stage::Rejected), Role::Initiator);
        assert_eq!(owning_role(Stage::Closed), Role::Initiator);
        assert_eq!(owning_role(Stage::PendingReview), Role::Reviewer);
    }
}
