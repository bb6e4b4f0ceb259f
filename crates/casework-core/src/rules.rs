//! The role-permission table: which role may move a case from which stage to
//! which next stage.
//!
//! The table is static data, populated once and never mutated at runtime. A
//! `(stage, role)` pair absent from the table implicitly denies. Rejection is
//! a policy edge rather than a table row: reject-authority roles may send any
//! non-terminal case to `Rejected` without walking the forward sequence.

use crate::model::role::Role;
use crate::model::stage::Stage;

/// Forward transition rows: `(from, role, to)`.
///
/// Note `UnderInvestigation` has two rows: the investigator submits their own
/// findings for review, and a reviewer may pull a case into review directly.
const FORWARD: &[(Stage, Role, Stage)] = &[
    (Stage::New, Role::Investigator, Stage::UnderInvestigation),
    (Stage::UnderInvestigation, Role::Investigator, Stage::PendingReview),
    (Stage::UnderInvestigation, Role::Reviewer, Stage::PendingReview),
    (Stage::PendingReview, Role::Reviewer, Stage::PendingApprovalL1),
    (Stage::PendingApprovalL1, Role::ApproverL1, Stage::PendingApprovalL2),
    (Stage::PendingApprovalL2, Role::ApproverL2, Stage::PendingLegalReview),
    (Stage::PendingLegalReview, Role::LegalReviewer, Stage::PendingClosure),
    (Stage::PendingClosure, Role::Actioner, Stage::Closed),
];

/// Read-only lookup over the static transition rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionTable;

impl PermissionTable {
    /// Whether `role` is permitted to act on a case at `stage` at all.
    ///
    /// Admin is not special-cased here: the engine resolves Admin's stage
    /// reach through [`Self::admin_next_stages`], keeping this lookup an
    /// exact table probe (absent pair denies).
    #[must_use]
    pub fn can_act(self, stage: Stage, role: Role) -> bool {
        !self.allowed_next_stages(stage, role).is_empty()
    }

    /// The stages `role` may move a case at `stage` to: the table's forward
    /// rows plus the reject edge for reject-authority roles.
    #[must_use]
    pub fn allowed_next_stages(self, stage: Stage, role: Role) -> Vec<Stage> {
        let mut next: Vec<Stage> = FORWARD
            .iter()
            .filter(|(from, by, _)| *from == stage && *by == role)
            .map(|(_, _, to)| *to)
            .collect();
        if role.has_reject_authority() && !stage.is_terminal() && role != Role::Admin {
            next.push(Stage::Rejected);
        }
        next
    }

    /// Admin's reach from `stage`: the union of every role's forward rows
    /// plus the reject edge. Admin bypasses the role check but still
    /// respects stage order; it can never leave a terminal stage.
    #[must_use]
    pub fn admin_next_stages(self, stage: Stage) -> Vec<Stage> {
        if stage.is_terminal() {
            return Vec::new();
        }
        let mut next: Vec<Stage> = FORWARD
            .iter()
            .filter(|(from, _, _)| *from == stage)
            .map(|(_, _, to)| *to)
            .collect();
        next.dedup();
        next.push(Stage::Rejected);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::PermissionTable;
    use crate::model::role::Role;
    use crate::model::stage::Stage;

    const TABLE: PermissionTable = PermissionTable;

    #[test]
    fn forward_rows_follow_the_workflow_order() {
        for (from, _, to) in super::FORWARD {
            assert_eq!(from.forward_successor(), Some(*to), "row {from} -> {to}");
        }
    }

    #[test]
    fn absent_pairs_deny() {
        assert!(!TABLE.can_act(Stage::New, Role::Initiator));
        assert!(!TABLE.can_act(Stage::PendingApprovalL1, Role::ApproverL2));
        assert!(!TABLE.can_act(Stage::PendingClosure, Role::Investigator));
    }

    #[test]
    fn reviewer_cannot_skip_review() {
        let next = TABLE.allowed_next_stages(Stage::UnderInvestigation, Role::Reviewer);
        assert!(next.contains(&Stage::PendingReview));
        assert!(!next.contains(&Stage::PendingApprovalL1));
    }

    #[test]
    fn reject_reachable_only_with_authority() {
        for stage in Stage::ALL {
            for role in Role::ALL {
                if role == Role::Admin {
                    continue;
                }
                let rejectable = TABLE
                    .allowed_next_stages(stage, role)
                    .contains(&Stage::Rejected);
                let expected = role.has_reject_authority() && !stage.is_terminal();
                assert_eq!(rejectable, expected, "stage {stage} role {role}");
            }
        }
    }

    #[test]
    fn terminal_stages_have_no_way_out() {
        for stage in [Stage::Closed, Stage::Rejected] {
            for role in Role::ALL {
                assert!(TABLE.allowed_next_stages(stage, role).is_empty());
            }
            assert!(TABLE.admin_next_stages(stage).is_empty());
        }
    }

    #[test]
    fn admin_reach_is_union_of_roles_plus_reject() {
        let next = TABLE.admin_next_stages(Stage::PendingApprovalL2);
        assert_eq!(next, vec![Stage::PendingLegalReview, Stage::Rejected]);

        // Both UnderInvestigation rows point at the same stage; union dedups.
        let next = TABLE.admin_next_stages(Stage::UnderInvestigation);
        assert_eq!(next, vec![Stage::PendingReview, Stage::Rejected]);
    }
}
