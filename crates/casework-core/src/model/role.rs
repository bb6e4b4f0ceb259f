use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::stage::ParseEnumError;

/// The fixed set of workflow roles. Admin is a superset role: it may act as
/// any other role after an explicit role switch, and is the only role
/// permitted to keep `admin` as its active role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Initiator,
    Investigator,
    Reviewer,
    ApproverL1,
    ApproverL2,
    LegalReviewer,
    Actioner,
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Initiator,
        Self::Investigator,
        Self::Reviewer,
        Self::ApproverL1,
        Self::ApproverL2,
        Self::LegalReviewer,
        Self::Actioner,
        Self::Admin,
    ];

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Initiator => "initiator",
            Self::Investigator => "investigator",
            Self::Reviewer => "reviewer",
            Self::ApproverL1 => "approver_l1",
            Self::ApproverL2 => "approver_l2",
            Self::LegalReviewer => "legal_reviewer",
            Self::Actioner => "actioner",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may send a case to `Rejected` from a non-terminal
    /// stage. Initiator, Investigator, and Actioner cannot reject.
    #[must_use]
    pub const fn has_reject_authority(self) -> bool {
        matches!(
            self,
            Self::Reviewer | Self::ApproverL1 | Self::ApproverL2 | Self::LegalReviewer | Self::Admin
        )
    }

    /// Whether this role may open new cases.
    #[must_use]
    pub const fn may_create_cases(self) -> bool {
        matches!(self, Self::Initiator | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "initiator" => Ok(Self::Initiator),
            "investigator" => Ok(Self::Investigator),
            "reviewer" => Ok(Self::Reviewer),
            "approver_l1" => Ok(Self::ApproverL1),
            "approver_l2" => Ok(Self::ApproverL2),
            "legal_reviewer" => Ok(Self::LegalReviewer),
            "actioner" => Ok(Self::Actioner),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}
