//! State machine for employment-verification requests.
//!
//! The lifecycle is strictly forward: PENDING -> GENERATED -> SENT, with
//! DECLINED reachable from PENDING or GENERATED as a terminal state. Every
//! handler goes through [`transition`] so the guards live in one place.

use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sea_orm::EnumIter, sea_orm::DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[sea_orm(string_value = "GENERATED")]
    #[serde(rename = "GENERATED")]
    Generated,
    #[sea_orm(string_value = "SENT")]
    #[serde(rename = "SENT")]
    Sent,
    #[sea_orm(string_value = "DECLINED")]
    #[serde(rename = "DECLINED")]
    Declined,
}

impl VerificationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Generated => "GENERATED",
            Self::Sent => "SENT",
            Self::Declined => "DECLINED",
        }
    }
}

/// Caller-requested transition. Nothing auto-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAction {
    Generate,
    MarkSent,
    Decline,
}

/// Guard violation. Distinct from not-found and forbidden so handlers can map
/// it to a validation failure without losing the current state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Verification letter has already been sent")]
    AlreadySent,
    #[error("Verification request has been declined")]
    AlreadyDeclined,
    #[error("Only generated requests can be marked as sent")]
    NotGenerated,
    #[error("Sent requests cannot be declined")]
    SentCannotDecline,
}

/// Applies `action` to `status`, returning the next status or the guard
/// violation. The caller stamps timestamps and actors on success.
pub fn transition(
    status: VerificationStatus,
    action: VerificationAction,
) -> Result<VerificationStatus, TransitionError> {
    use VerificationAction as A;
    use VerificationStatus as S;

    match (status, action) {
        (S::Pending | S::Generated, A::Generate) => Ok(S::Generated),
        (S::Sent, A::Generate) => Err(TransitionError::AlreadySent),
        (S::Declined, A::Generate) => Err(TransitionError::AlreadyDeclined),

        (S::Generated, A::MarkSent) => Ok(S::Sent),
        (_, A::MarkSent) => Err(TransitionError::NotGenerated),

        (S::Pending | S::Generated, A::Decline) => Ok(S::Declined),
        (S::Sent, A::Decline) => Err(TransitionError::SentCannotDecline),
        (S::Declined, A::Decline) => Err(TransitionError::AlreadyDeclined),
    }
}

/// Whether the rendered letter may be downloaded in this state. A stored blob
/// key is additionally required; the repository checks that.
#[must_use]
pub const fn letter_available(status: VerificationStatus) -> bool {
    matches!(
        status,
        VerificationStatus::Generated | VerificationStatus::Sent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use VerificationAction as A;
    use VerificationStatus as S;

    #[test]
    fn forward_path() {
        assert_eq!(transition(S::Pending, A::Generate), Ok(S::Generated));
        assert_eq!(transition(S::Generated, A::MarkSent), Ok(S::Sent));
    }

    #[test]
    fn regenerate_before_sent_is_allowed() {
        assert_eq!(transition(S::Generated, A::Generate), Ok(S::Generated));
    }

    #[test]
    fn decline_from_pending_or_generated() {
        assert_eq!(transition(S::Pending, A::Decline), Ok(S::Declined));
        assert_eq!(transition(S::Generated, A::Decline), Ok(S::Declined));
    }

    #[test]
    fn sent_is_terminal() {
        assert_eq!(transition(S::Sent, A::Generate), Err(TransitionError::AlreadySent));
        assert_eq!(transition(S::Sent, A::MarkSent), Err(TransitionError::NotGenerated));
        assert_eq!(
            transition(S::Sent, A::Decline),
            Err(TransitionError::SentCannotDecline)
        );
    }

    #[test]
    fn declined_is_terminal() {
        assert_eq!(
            transition(S::Declined, A::Generate),
            Err(TransitionError::AlreadyDeclined)
        );
        assert_eq!(
            transition(S::Declined, A::MarkSent),
            Err(TransitionError::NotGenerated)
        );
        assert_eq!(
            transition(S::Declined, A::Decline),
            Err(TransitionError::AlreadyDeclined)
        );
    }

    #[test]
    fn mark_sent_requires_generated() {
        assert_eq!(transition(S::Pending, A::MarkSent), Err(TransitionError::NotGenerated));
    }

    #[test]
    fn letter_availability() {
        assert!(!letter_available(S::Pending));
        assert!(letter_available(S::Generated));
        assert!(letter_available(S::Sent));
        assert!(!letter_available(S::Declined));
    }
}
