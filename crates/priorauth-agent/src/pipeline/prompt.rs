use std::fmt::Write as _;

use super::domain::{AppealRequest, AuthorizationRequest};
use super::reference::{CoverageLookupResult, CriteriaReference};

const NOT_PROVIDED: &str = "not provided";

/// Renders the decision instruction document sent to the reasoning service.
/// Pure and deterministic: identical inputs always produce identical text, and
/// every request field appears exactly once, with explicit placeholders for
/// absent optional fields so prompts stay auditable and diffable.
pub fn decision_prompt(
    request_id: &str,
    request: &AuthorizationRequest,
    criteria: Option<&CriteriaReference>,
    coverage: &CoverageLookupResult,
) -> String {
    let mut prompt = String::new();

    writeln!(
        prompt,
        "You are an AI prior authorization decision engine on a decentralized subnet."
    )
    .expect("write role framing");
    writeln!(
        prompt,
        "Process this PA request using evidence-based medical criteria and insurance guidelines."
    )
    .expect("write task statement");
    prompt.push('\n');

    writeln!(prompt, "Request ID: {request_id}").expect("write request id");
    writeln!(prompt, "Patient Age: {}", request.patient_age).expect("write age");
    writeln!(
        prompt,
        "Diagnosis ICD-10: {} - {}",
        request.diagnosis_code,
        criteria.map_or("unknown", |reference| reference.name.as_str())
    )
    .expect("write diagnosis");
    writeln!(
        prompt,
        "Procedure/Medication: {} / {}",
        request.procedure_code,
        request.medication.as_deref().unwrap_or("N/A")
    )
    .expect("write procedure");
    writeln!(prompt, "Insurance Plan: {}", request.insurance_plan).expect("write plan");
    writeln!(
        prompt,
        "Clinical Notes: {}",
        request.clinical_notes.as_deref().unwrap_or(NOT_PROVIDED)
    )
    .expect("write notes");
    writeln!(
        prompt,
        "Previous Treatments: {}",
        match request.previous_treatments.as_deref() {
            Some(treatments) if !treatments.is_empty() => treatments.join(", "),
            _ => "none documented".to_string(),
        }
    )
    .expect("write treatments");

    writeln!(
        prompt,
        "Known PA Criteria for this diagnosis: {}",
        match criteria {
            Some(reference) if !reference.common_criteria.is_empty() =>
                reference.common_criteria.join("; "),
            _ => "none".to_string(),
        }
    )
    .expect("write criteria");
    write_coverage(&mut prompt, coverage);
    prompt.push('\n');

    prompt.push_str(
        "Make a prior authorization decision. Respond with a single JSON object and nothing else:\n\
{\n\
  \"status\": \"APPROVED\" | \"DENIED\" | \"PENDING_INFO\",\n\
  \"decision\": \"brief decision statement\",\n\
  \"rationale\": \"detailed clinical rationale\",\n\
  \"criteria_met\": [\"criterion\"],\n\
  \"criteria_missing\": [\"missing criterion\"],\n\
  \"alternative_recommendations\": [\"alternative\"],\n\
  \"appeal_guidance\": \"guidance if denied, null if approved\",\n\
  \"confidence\": 0.0 to 1.0\n\
}\n",
    );

    prompt
}

fn write_coverage(prompt: &mut String, coverage: &CoverageLookupResult) {
    match coverage {
        CoverageLookupResult::Criteria { source, payload } => {
            writeln!(prompt, "Coverage Data ({source}): {payload}").expect("write coverage")
        }
        CoverageLookupResult::NotFound { source, plan } => writeln!(
            prompt,
            "Coverage Data ({source}): no specific criteria found for plan {plan}"
        )
        .expect("write coverage"),
        CoverageLookupResult::Fallback { plan, procedure } => writeln!(
            prompt,
            "Coverage Data: source unavailable, decide from plan {plan} and procedure {procedure} alone"
        )
        .expect("write coverage"),
    }
}

/// Renders the appeal-strategy instruction document. Same rendering rules as
/// the decision prompt with the appeal field set and schema.
pub fn appeal_prompt(appeal: &AppealRequest) -> String {
    let mut prompt = String::new();

    writeln!(prompt, "You are a prior authorization appeal specialist AI.")
        .expect("write role framing");
    writeln!(
        prompt,
        "Analyze this post-denial appeal and lay out the strongest path to overturn it."
    )
    .expect("write task statement");
    prompt.push('\n');

    writeln!(prompt, "Original Request ID: {}", appeal.original_request_id)
        .expect("write original id");
    writeln!(prompt, "Denial Reason: {}", appeal.denial_reason).expect("write denial reason");
    writeln!(
        prompt,
        "Additional Clinical Evidence: {}",
        appeal.additional_clinical_evidence
    )
    .expect("write evidence");
    writeln!(
        prompt,
        "Physician Statement: {}",
        appeal.physician_statement.as_deref().unwrap_or(NOT_PROVIDED)
    )
    .expect("write physician statement");
    prompt.push('\n');

    prompt.push_str(
        "Provide strategic guidance. Respond with a single JSON object and nothing else:\n\
{\n\
  \"likelihood_of_success\": 0.0 to 1.0,\n\
  \"strongest_arguments\": [\"argument\"],\n\
  \"required_documentation\": [\"document\"],\n\
  \"recommended_approach\": \"strategy narrative\",\n\
  \"estimated_review_days\": integer\n\
}\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reference::CriteriaDirectory;

    fn sample_request() -> AuthorizationRequest {
        AuthorizationRequest {
            patient_age: 45,
            diagnosis_code: "M54.5".to_string(),
            procedure_code: "PT-EVAL".to_string(),
            medication: None,
            insurance_plan: "Aetna-PPO".to_string(),
            clinical_notes: Some("6 weeks PT completed, no improvement".to_string()),
            previous_treatments: Some(vec!["NSAIDs".to_string(), "Physical therapy".to_string()]),
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let directory = CriteriaDirectory::standard();
        let request = sample_request();
        let coverage = CoverageLookupResult::NotFound {
            source: "CMS".to_string(),
            plan: request.insurance_plan.clone(),
        };

        let first = decision_prompt("PA-TEST1234", &request, directory.lookup("M54.5"), &coverage);
        let second = decision_prompt("PA-TEST1234", &request, directory.lookup("M54.5"), &coverage);
        assert_eq!(first, second);
    }

    #[test]
    fn every_field_appears_with_placeholders_for_absent_options() {
        let request = AuthorizationRequest {
            medication: None,
            clinical_notes: None,
            previous_treatments: None,
            ..sample_request()
        };
        let coverage = CoverageLookupResult::Fallback {
            plan: request.insurance_plan.clone(),
            procedure: request.procedure_code.clone(),
        };

        let prompt = decision_prompt("PA-TEST1234", &request, None, &coverage);
        assert!(prompt.contains("Request ID: PA-TEST1234"));
        assert!(prompt.contains("Patient Age: 45"));
        assert!(prompt.contains("Diagnosis ICD-10: M54.5 - unknown"));
        assert!(prompt.contains("Procedure/Medication: PT-EVAL / N/A"));
        assert!(prompt.contains("Clinical Notes: not provided"));
        assert!(prompt.contains("Previous Treatments: none documented"));
        assert!(prompt.contains("Known PA Criteria for this diagnosis: none"));
        assert!(prompt.contains("plan Aetna-PPO and procedure PT-EVAL"));
    }

    #[test]
    fn known_criteria_and_coverage_payload_are_embedded_verbatim() {
        let directory = CriteriaDirectory::standard();
        let coverage = CoverageLookupResult::Criteria {
            source: "CMS".to_string(),
            payload: serde_json::json!({ "articles": [{ "id": "A12345" }] }),
        };

        let prompt = decision_prompt(
            "PA-TEST1234",
            &sample_request(),
            directory.lookup("M54.5"),
            &coverage,
        );
        assert!(prompt.contains("PT failure documented"));
        assert!(prompt.contains("Coverage Data (CMS):"));
        assert!(prompt.contains("\"id\":\"A12345\""));
    }

    #[test]
    fn decision_schema_terminates_the_prompt() {
        let coverage = CoverageLookupResult::NotFound {
            source: "CMS".to_string(),
            plan: "Aetna-PPO".to_string(),
        };
        let prompt = decision_prompt("PA-TEST1234", &sample_request(), None, &coverage);
        assert!(prompt.trim_end().ends_with('}'));
        assert!(prompt.contains("\"status\": \"APPROVED\" | \"DENIED\" | \"PENDING_INFO\""));
        assert!(prompt.contains("\"confidence\": 0.0 to 1.0"));
    }

    #[test]
    fn appeal_prompt_covers_all_fields_and_schema() {
        let appeal = AppealRequest {
            original_request_id: "PA-ABCD1234".to_string(),
            denial_reason: "Insufficient documentation of conservative treatment".to_string(),
            additional_clinical_evidence: "MRI shows L4-L5 herniation".to_string(),
            physician_statement: None,
        };

        let prompt = appeal_prompt(&appeal);
        assert!(prompt.contains("Original Request ID: PA-ABCD1234"));
        assert!(prompt.contains("Physician Statement: not provided"));
        assert!(prompt.contains("\"likelihood_of_success\": 0.0 to 1.0"));
        assert!(prompt.contains("\"estimated_review_days\": integer"));
    }
}
