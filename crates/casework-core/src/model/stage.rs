use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The workflow stages a case moves through, in forward order, plus the
/// `Rejected` terminal reachable from any review/approval stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    UnderInvestigation,
    PendingReview,
    PendingApprovalL1,
    PendingApprovalL2,
    PendingLegalReview,
    PendingClosure,
    Closed,
    Rejected,
}

impl Stage {
    /// Every stage, in declaration order. Handy for table scans and tests.
    pub const ALL: [Self; 9] = [
        Self::New,
        Self::UnderInvestigation,
        Self::PendingReview,
        Self::PendingApprovalL1,
        Self::PendingApprovalL2,
        Self::PendingLegalReview,
        Self::PendingClosure,
        Self::Closed,
        Self::Rejected,
    ];

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::UnderInvestigation => "under_investigation",
            Self::PendingReview => "pending_review",
            Self::PendingApprovalL1 => "pending_approval_l1",
            Self::PendingApprovalL2 => "pending_approval_l2",
            Self::PendingLegalReview => "pending_legal_review",
            Self::PendingClosure => "pending_closure",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// `Closed` and `Rejected` are terminal: no transition is defined out of
    /// them, and any request against a terminal case must fail.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }

    /// The next stage in the forward workflow sequence, if any.
    ///
    /// This is the *sequence*, not the permission to move: whether a given
    /// role may perform the step is the permission table's call.
    #[must_use]
    pub const fn forward_successor(self) -> Option<Self> {
        match self {
            Self::New => Some(Self::UnderInvestigation),
            Self::UnderInvestigation => Some(Self::PendingReview),
            Self::PendingReview => Some(Self::PendingApprovalL1),
            Self::PendingApprovalL1 => Some(Self::PendingApprovalL2),
            Self::PendingApprovalL2 => Some(Self::PendingLegalReview),
            Self::PendingLegalReview => Some(Self::PendingClosure),
            Self::PendingClosure => Some(Self::Closed),
            Self::Closed | Self::Rejected => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "under_investigation" => Ok(Self::UnderInvestigation),
            "pending_review" => Ok(Self::PendingReview),
            "pending_approval_l1" => Ok(Self::PendingApprovalL1),
            "pending_approval_l2" => Ok(Self::PendingApprovalL2),
            "pending_legal_review" => Ok(Self::PendingLegalReview),
            "pending_closure" => Ok(Self::PendingClosure),
            "closed" => Ok(Self::Closed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError {
                expected: "stage",
                got: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}
