use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validated clinical request produced by the HTTP layer. Immutable once
/// constructed; the pipeline never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub patient_age: u32,
    /// ICD-10 diagnosis code; may be unknown to the criteria directory.
    pub diagnosis_code: String,
    /// CPT procedure or service code.
    pub procedure_code: String,
    #[serde(default)]
    pub medication: Option<String>,
    pub insurance_plan: String,
    #[serde(default)]
    pub clinical_notes: Option<String>,
    #[serde(default)]
    pub previous_treatments: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionStatus {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "DENIED")]
    Denied,
    #[serde(rename = "PENDING_INFO")]
    PendingInfo,
}

impl DecisionStatus {
    /// Approval/denial polarity used for ground-truth calibration. DENIED and
    /// PENDING_INFO both sit on the non-approval side.
    pub fn is_approval(self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => Some(Self::Approved),
            "DENIED" => Some(Self::Denied),
            "PENDING_INFO" => Some(Self::PendingInfo),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::PendingInfo => "PENDING_INFO",
        }
    }
}

/// Final output of the authorization pipeline. Always well-formed: extraction
/// failures surface as a low-confidence PENDING_INFO decision rather than an
/// error (see `pipeline::extract`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    pub request_id: String,
    pub status: DecisionStatus,
    pub decision: String,
    pub rationale: String,
    pub criteria_met: Vec<String>,
    pub criteria_missing: Vec<String>,
    pub alternative_recommendations: Vec<String>,
    /// Present only when the status is DENIED; cleared during extraction
    /// otherwise.
    pub appeal_guidance: Option<String>,
    /// Always within [0.0, 1.0].
    pub confidence: f64,
    pub processing_time_ms: u64,
}

/// Post-denial appeal submitted for strategic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealRequest {
    pub original_request_id: String,
    pub denial_reason: String,
    pub additional_clinical_evidence: String,
    #[serde(default)]
    pub physician_statement: Option<String>,
}

/// Output of the appeal analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealAnalysis {
    pub appeal_id: String,
    /// Always within [0.0, 1.0].
    pub likelihood_of_success: f64,
    pub strongest_arguments: Vec<String>,
    pub required_documentation: Vec<String>,
    pub recommended_approach: String,
    pub estimated_review_days: u32,
}

/// Request identifiers are minted locally, never by the reasoning service, so
/// even a degraded decision stays traceable.
pub fn new_request_id() -> String {
    format!("PA-{}", random_suffix(8))
}

pub fn new_appeal_id() -> String {
    format!("APL-{}", random_suffix(6))
}

fn random_suffix(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len].to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn request_ids_use_fixed_prefix_and_short_suffix() {
        let id = new_request_id();
        assert!(id.starts_with("PA-"));
        assert_eq!(id.len(), "PA-".len() + 8);
        assert!(id["PA-".len()..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        let appeal = new_appeal_id();
        assert!(appeal.starts_with("APL-"));
        assert_eq!(appeal.len(), "APL-".len() + 6);
    }

    #[test]
    fn request_ids_do_not_collide_in_practice() {
        let ids: HashSet<String> = (0..512).map(|_| new_request_id()).collect();
        assert_eq!(ids.len(), 512);
    }

    #[test]
    fn status_parses_known_values_case_insensitively() {
        assert_eq!(DecisionStatus::parse("APPROVED"), Some(DecisionStatus::Approved));
        assert_eq!(DecisionStatus::parse(" denied "), Some(DecisionStatus::Denied));
        assert_eq!(
            DecisionStatus::parse("pending_info"),
            Some(DecisionStatus::PendingInfo)
        );
        assert_eq!(DecisionStatus::parse("MAYBE"), None);
    }

    #[test]
    fn status_serializes_to_wire_names() {
        let json = serde_json::to_string(&DecisionStatus::PendingInfo).expect("serializes");
        assert_eq!(json, "\"PENDING_INFO\"");
    }

    #[test]
    fn only_approved_counts_as_approval_polarity() {
        assert!(DecisionStatus::Approved.is_approval());
        assert!(!DecisionStatus::Denied.is_approval());
        assert!(!DecisionStatus::PendingInfo.is_approval());
    }
}
