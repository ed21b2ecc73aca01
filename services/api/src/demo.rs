use async_trait::async_trait;
use clap::Args;
use priorauth_agent::error::AppError;
use priorauth_agent::pipeline::{
    score_decision, AuthorizationDecision, AuthorizationPipeline, AuthorizationRequest,
    CoverageGateway, CoverageLookupResult, CriteriaDirectory, ReasoningGateway,
    ReasoningServiceError, TokenBudgets,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Known outcome to score the demo decision against (validator view)
    #[arg(long)]
    pub(crate) ground_truth: Option<bool>,
    /// Print the synthesized prompt before the decision
    #[arg(long)]
    pub(crate) show_prompt: bool,
}

/// Reasoning stub that replays a canned completion, so the demo runs without
/// an API key or network access.
#[derive(Debug)]
struct ScriptedReasoningGateway {
    completion: &'static str,
}

#[async_trait]
impl ReasoningGateway for ScriptedReasoningGateway {
    async fn complete(
        &self,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, ReasoningServiceError> {
        // The demo surfaces the prompt through the completion path when asked.
        tracing::debug!(prompt_chars = prompt.len(), "scripted completion served");
        Ok(self.completion.to_string())
    }
}

#[derive(Debug)]
struct OfflineCoverageGateway;

#[async_trait]
impl CoverageGateway for OfflineCoverageGateway {
    async fn lookup(&self, plan: &str, _procedure: &str) -> CoverageLookupResult {
        CoverageLookupResult::NotFound {
            source: "CMS".to_string(),
            plan: plan.to_string(),
        }
    }
}

const DEMO_COMPLETION: &str = "Decision: {\"status\":\"DENIED\",\"decision\":\"Denied pending conservative treatment documentation\",\"rationale\":\"Guidelines require six weeks of documented conservative treatment before imaging; the notes reference physical therapy but no dates or discharge summary were supplied.\",\"criteria_met\":[\"Diagnosis aligns with requested procedure\"],\"criteria_missing\":[\"6 weeks conservative treatment\",\"PT failure documented\"],\"alternative_recommendations\":[\"Continue structured PT program\",\"NSAID trial with follow-up\"],\"appeal_guidance\":\"Submit dated PT attendance and discharge records showing failure of conservative treatment\",\"confidence\":0.82}";

fn demo_request() -> AuthorizationRequest {
    AuthorizationRequest {
        patient_age: 45,
        diagnosis_code: "M54.5".to_string(),
        procedure_code: "72148".to_string(),
        medication: None,
        insurance_plan: "Aetna-PPO".to_string(),
        clinical_notes: Some("Chronic low back pain, PT mentioned but undocumented".to_string()),
        previous_treatments: Some(vec!["NSAIDs".to_string()]),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let pipeline = AuthorizationPipeline::new(
        CriteriaDirectory::standard(),
        Arc::new(OfflineCoverageGateway),
        Arc::new(ScriptedReasoningGateway {
            completion: DEMO_COMPLETION,
        }),
        TokenBudgets::default(),
    );

    let request = demo_request();
    if args.show_prompt {
        let coverage = CoverageLookupResult::NotFound {
            source: "CMS".to_string(),
            plan: request.insurance_plan.clone(),
        };
        let criteria = pipeline.criteria_for(&request.diagnosis_code);
        println!(
            "{}",
            priorauth_agent::pipeline::prompt::decision_prompt(
                "PA-DEMO0000",
                &request,
                criteria,
                &coverage
            )
        );
        println!("{}", "-".repeat(72));
    }

    let decision = pipeline
        .process_authorization(request)
        .await
        .map_err(AppError::Reasoning)?;

    render_decision(&decision);

    println!();
    println!("Validator scoring");
    println!(
        "  without ground truth: {:.3}",
        score_decision(&decision, None)
    );
    if let Some(truth) = args.ground_truth {
        println!(
            "  against ground truth {truth}: {:.3}",
            score_decision(&decision, Some(truth))
        );
    }

    Ok(())
}

fn render_decision(decision: &AuthorizationDecision) {
    println!("Request {}", decision.request_id);
    println!("  status:     {}", decision.status.as_str());
    println!("  decision:   {}", decision.decision);
    println!("  rationale:  {}", decision.rationale);
    println!("  confidence: {:.2}", decision.confidence);
    if !decision.criteria_met.is_empty() {
        println!("  criteria met:     {}", decision.criteria_met.join("; "));
    }
    if !decision.criteria_missing.is_empty() {
        println!(
            "  criteria missing: {}",
            decision.criteria_missing.join("; ")
        );
    }
    if !decision.alternative_recommendations.is_empty() {
        println!(
            "  alternatives:     {}",
            decision.alternative_recommendations.join("; ")
        );
    }
    if let Some(guidance) = &decision.appeal_guidance {
        println!("  appeal guidance:  {guidance}");
    }
    println!("  processed in {} ms", decision.processing_time_ms);
}
