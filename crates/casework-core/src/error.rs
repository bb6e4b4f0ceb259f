use std::fmt;

use crate::model::role::Role;
use crate::model::stage::Stage;

/// Machine-readable error codes for callers that route on outcomes rather
/// than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CaseNotFound,
    SessionNotFound,
    Unauthorized,
    SessionExpired,
    StageConflict,
    RoleSwitchDenied,
    InvalidTransition,
    AuthFailed,
    ConfigParseError,
    StorageFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CaseNotFound => "E2001",
            Self::SessionNotFound => "E2002",
            Self::Unauthorized => "E3001",
            Self::SessionExpired => "E3002",
            Self::RoleSwitchDenied => "E3003",
            Self::InvalidTransition => "E3004",
            Self::AuthFailed => "E3005",
            Self::StageConflict => "E4001",
            Self::ConfigParseError => "E1001",
            Self::StorageFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CaseNotFound => "Case not found",
            Self::SessionNotFound => "Session not found",
            Self::Unauthorized => "Role not permitted for this stage",
            Self::SessionExpired => "Session expired",
            Self::RoleSwitchDenied => "Role switch denied",
            Self::InvalidTransition => "Transition not allowed from this stage",
            Self::AuthFailed => "Authentication failed",
            Self::StageConflict => "Case stage changed underneath the request",
            Self::ConfigParseError => "Config file parse error",
            Self::StorageFailed => "Case store operation failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::CaseNotFound | Self::SessionNotFound => None,
            Self::Unauthorized => Some("Check the active role; only the owning role may act."),
            Self::SessionExpired => Some("Log in again; inactive sessions are closed."),
            Self::RoleSwitchDenied => {
                Some("Role switching requires the all-roles-access capability.")
            }
            Self::InvalidTransition => {
                Some("Follow the workflow order; terminal cases accept no further actions.")
            }
            Self::AuthFailed => Some("Verify the user id and password."),
            Self::StageConflict => Some("Reload the case and reattempt with its current stage."),
            Self::ConfigParseError => Some("Fix syntax in casework.toml and retry."),
            Self::StorageFailed => Some("Check database path, disk space, and permissions."),
        }
    }

    /// Whether a caller may sensibly retry the same request after a reload.
    /// Only a lost stage race is retriable; everything else needs a different
    /// request or a fresh login.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::StageConflict)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Typed outcomes for every engine operation. Each failure leaves case and
/// session state untouched; the presentation layer maps these to feedback.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("case '{0}' not found")]
    CaseNotFound(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("role '{role}' may not act on stage '{stage}'")]
    Unauthorized { stage: Stage, role: Role },

    #[error("session expired")]
    SessionExpired,

    #[error("stage moved before commit: expected '{expected}', found '{actual}'")]
    StageConflict { expected: Stage, actual: Stage },

    #[error("role switch to '{requested}' denied")]
    RoleSwitchDenied { requested: Role },

    #[error("no transition from '{from}' to '{to}'")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("authentication failed for '{username}'")]
    AuthFailed { username: String },

    #[error("case store failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for WorkflowError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.into())
    }
}

impl WorkflowError {
    /// Map the error to its stable machine code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CaseNotFound(_) => ErrorCode::CaseNotFound,
            Self::SessionNotFound => ErrorCode::SessionNotFound,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::SessionExpired => ErrorCode::SessionExpired,
            Self::StageConflict { .. } => ErrorCode::StageConflict,
            Self::RoleSwitchDenied { .. } => ErrorCode::RoleSwitchDenied,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::AuthFailed { .. } => ErrorCode::AuthFailed,
            Self::Storage(_) => ErrorCode::StorageFailed,
        }
    }
}
