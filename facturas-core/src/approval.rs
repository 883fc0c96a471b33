//! The approval state machine.
//!
//! pending → approved and pending → rejected are the only transitions;
//! both targets are terminal. Validation happens here, before any network
//! call — the orchestrator composes validate → PATCH → reload and treats
//! local state as unchanged until the backend confirms.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates;
use crate::error::PipelineError;
use crate::invoice::Status;

/// An operator decision over a pending invoice.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve { actor: String },
    Reject { actor: String, reason: String },
}

impl Decision {
    pub fn target(&self) -> Status {
        match self {
            Decision::Approve { .. } => Status::Approved,
            Decision::Reject { .. } => Status::Rejected,
        }
    }
}

/// Check the decision payload itself, independent of the record's current
/// state. This runs before anything touches the network: a rejection with
/// an empty reason must never produce a call.
pub fn validate_decision(decision: &Decision) -> Result<(), PipelineError> {
    if let Decision::Reject { reason, .. } = decision {
        if reason.trim().is_empty() {
            return Err(PipelineError::ValidationFailed(
                "Debe indicar un motivo de rechazo".to_string(),
            ));
        }
    }
    Ok(())
}

/// Check that a decision is legal from the current state. Terminal states
/// admit no further transitions.
pub fn validate_transition(current: Status, decision: &Decision) -> Result<(), PipelineError> {
    validate_decision(decision)?;
    if current.is_terminal() {
        return Err(PipelineError::ValidationFailed(format!(
            "La factura ya fue {}; no admite cambios",
            current.label().to_lowercase()
        )));
    }
    Ok(())
}

/// PATCH payload for a confirmed transition. `statusDate` goes out in ISO
/// form, as every form payload does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionFields {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub status_date: String,
}

/// Build the stamp fields for a validated decision.
pub fn transition_fields(decision: &Decision, today: NaiveDate) -> TransitionFields {
    match decision {
        Decision::Approve { actor } => TransitionFields {
            status: Status::Approved,
            approved_by: Some(actor.clone()),
            rejected_by: None,
            rejection_reason: None,
            status_date: dates::format_iso(today),
        },
        Decision::Reject { actor, reason } => TransitionFields {
            status: Status::Rejected,
            approved_by: None,
            rejected_by: Some(actor.clone()),
            rejection_reason: Some(reason.clone()),
            status_date: dates::format_iso(today),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approve() -> Decision {
        Decision::Approve { actor: "maria@obra.pe".to_string() }
    }

    #[test]
    fn test_approve_from_pending_only() {
        assert!(validate_transition(Status::Pending, &approve()).is_ok());

        let err = validate_transition(Status::Approved, &approve()).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationFailed(_)));

        let err = validate_transition(Status::Rejected, &approve()).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationFailed(_)));
    }

    #[test]
    fn test_reject_requires_reason() {
        let no_reason = Decision::Reject {
            actor: "maria@obra.pe".to_string(),
            reason: "   ".to_string(),
        };
        let err = validate_transition(Status::Pending, &no_reason).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationFailed(_)));

        let with_reason = Decision::Reject {
            actor: "maria@obra.pe".to_string(),
            reason: "Monto ilegible".to_string(),
        };
        assert!(validate_transition(Status::Pending, &with_reason).is_ok());
    }

    #[test]
    fn test_validate_decision_is_state_independent() {
        // The payload check alone refuses an empty reason; an approval
        // payload has nothing to validate.
        let empty = Decision::Reject {
            actor: "maria@obra.pe".to_string(),
            reason: String::new(),
        };
        assert!(matches!(
            validate_decision(&empty),
            Err(PipelineError::ValidationFailed(_))
        ));
        assert!(validate_decision(&approve()).is_ok());
    }

    #[test]
    fn test_transition_fields_stamps() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        let f = transition_fields(&approve(), today);
        assert_eq!(f.status, Status::Approved);
        assert_eq!(f.approved_by.as_deref(), Some("maria@obra.pe"));
        assert_eq!(f.rejected_by, None);
        assert_eq!(f.status_date, "2025-03-04");

        let reject = Decision::Reject {
            actor: "jose@obra.pe".to_string(),
            reason: "Duplicada".to_string(),
        };
        let f = transition_fields(&reject, today);
        assert_eq!(f.status, Status::Rejected);
        assert_eq!(f.rejected_by.as_deref(), Some("jose@obra.pe"));
        assert_eq!(f.rejection_reason.as_deref(), Some("Duplicada"));
        assert_eq!(f.approved_by, None);
    }

    #[test]
    fn test_patch_payload_shape() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let json = serde_json::to_value(transition_fields(&approve(), today)).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["approvedBy"], "maria@obra.pe");
        assert_eq!(json["statusDate"], "2025-03-04");
        assert!(json.get("rejectedBy").is_none());
    }
}
