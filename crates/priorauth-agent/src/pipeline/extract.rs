use serde_json::{Map, Value};
use tracing::debug;

use super::domain::{AppealAnalysis, AuthorizationDecision, DecisionStatus};

/// Default confidence/likelihood when the model omits the field.
const DEFAULT_CONFIDENCE: f64 = 0.5;
/// Confidence assigned to a degraded decision, deliberately below the
/// missing-field default to signal reduced trust.
const DEGRADED_CONFIDENCE: f64 = 0.3;
/// Single sentinel entry recorded in `criteria_missing` on parse failure.
const PARSE_FAILURE_NOTE: &str = "Unable to parse decision";
const MANUAL_REVIEW_DECISION: &str = "Manual review required";
const DEFAULT_REVIEW_DAYS: u32 = 30;

/// Builds the authorization decision from raw completion text.
///
/// The model is instructed, but not guaranteed, to emit exactly one JSON
/// object. Strict attempt first: the span between the first `{` and the last
/// `}` is parsed as JSON, and each field is populated permissively with
/// per-field defaults. If no such span exists or it does not parse, the
/// result is a deterministic degraded decision that keeps the raw completion
/// in `rationale` for the human reviewer. Either way the caller receives a
/// well-typed decision; this function never fails.
pub fn decision_from_completion(
    request_id: String,
    completion: &str,
    processing_time_ms: u64,
) -> AuthorizationDecision {
    match structured_payload(completion) {
        Some(payload) => {
            let status = payload
                .get("status")
                .and_then(Value::as_str)
                .and_then(DecisionStatus::parse)
                .unwrap_or(DecisionStatus::PendingInfo);

            // Appeal guidance is meaningful only for denials; clearing it here
            // makes "guidance implies denied" hold by construction.
            let appeal_guidance = if status == DecisionStatus::Denied {
                optional_text_field(&payload, "appeal_guidance")
            } else {
                None
            };

            AuthorizationDecision {
                request_id,
                status,
                decision: text_field(&payload, "decision"),
                rationale: text_field(&payload, "rationale"),
                criteria_met: list_field(&payload, "criteria_met"),
                criteria_missing: list_field(&payload, "criteria_missing"),
                alternative_recommendations: list_field(&payload, "alternative_recommendations"),
                appeal_guidance,
                confidence: unit_field(&payload, "confidence"),
                processing_time_ms,
            }
        }
        None => {
            debug!(%request_id, "completion had no parseable payload, degrading to manual review");
            AuthorizationDecision {
                request_id,
                status: DecisionStatus::PendingInfo,
                decision: MANUAL_REVIEW_DECISION.to_string(),
                rationale: completion.to_string(),
                criteria_met: Vec::new(),
                criteria_missing: vec![PARSE_FAILURE_NOTE.to_string()],
                alternative_recommendations: Vec::new(),
                appeal_guidance: None,
                confidence: DEGRADED_CONFIDENCE,
                processing_time_ms,
            }
        }
    }
}

/// Appeal counterpart of [`decision_from_completion`]; the degraded path
/// keeps the raw completion in `recommended_approach`.
pub fn analysis_from_completion(appeal_id: String, completion: &str) -> AppealAnalysis {
    match structured_payload(completion) {
        Some(payload) => AppealAnalysis {
            appeal_id,
            likelihood_of_success: unit_field(&payload, "likelihood_of_success"),
            strongest_arguments: list_field(&payload, "strongest_arguments"),
            required_documentation: list_field(&payload, "required_documentation"),
            recommended_approach: text_field(&payload, "recommended_approach"),
            estimated_review_days: days_field(&payload, "estimated_review_days"),
        },
        None => {
            debug!(%appeal_id, "appeal completion had no parseable payload");
            AppealAnalysis {
                appeal_id,
                likelihood_of_success: DEFAULT_CONFIDENCE,
                strongest_arguments: Vec::new(),
                required_documentation: Vec::new(),
                recommended_approach: completion.to_string(),
                estimated_review_days: DEFAULT_REVIEW_DAYS,
            }
        }
    }
}

/// Locates the candidate payload (first `{` through last `}`) and parses it.
/// Returns `None` when no brace pair exists or the span is not a JSON object.
fn structured_payload(completion: &str) -> Option<Map<String, Value>> {
    let start = completion.find('{')?;
    let end = completion.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&completion[start..=end]).ok()
}

// Per-field defaulting rules. Every field the schema names is optional in the
// parsed payload; these helpers are the single place where defaults and the
// [0, 1] clamp live.

fn text_field(payload: &Map<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_text_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn list_field(payload: &Map<String, Value>, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Confidence/likelihood: defaults to 0.5 and is clamped into [0.0, 1.0] at
/// extraction time, so downstream consumers never see out-of-range values.
fn unit_field(payload: &Map<String, Value>, key: &str) -> f64 {
    payload
        .get(key)
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0)
}

fn days_field(payload: &Map<String, Value>, key: &str) -> u32 {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_REVIEW_DAYS)
}
