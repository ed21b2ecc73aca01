//! Prior-authorization decision pipeline.
//!
//! Reference lookup feeds the prompt synthesizer, whose output goes to the
//! reasoning service; the extractor turns the completion back into a typed
//! decision. Scoring is a detached pure function over previously produced
//! decisions. Each request is processed independently with no shared mutable
//! state; the only suspension points are the two outbound network calls.

pub mod domain;
pub mod extract;
pub mod prompt;
pub mod reasoning;
pub mod reference;
pub mod scoring;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

pub use domain::{
    AppealAnalysis, AppealRequest, AuthorizationDecision, AuthorizationRequest, DecisionStatus,
};
pub use reasoning::{AnthropicMessagesClient, ReasoningGateway, ReasoningServiceError};
pub use reference::{
    CmsCoverageClient, CoverageGateway, CoverageLookupResult, CriteriaDirectory, CriteriaReference,
};
pub use scoring::score_decision;

/// Output-size caps for the two prompt schemas, bounding worst-case latency
/// and cost of a single reasoning call.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgets {
    pub decision: u32,
    pub appeal: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            decision: 1500,
            appeal: 900,
        }
    }
}

/// Request-scoped decision pipeline. Holds only immutable reference data and
/// shared gateway handles, so any number of requests may be in flight at once.
#[derive(Debug)]
pub struct AuthorizationPipeline {
    criteria: CriteriaDirectory,
    coverage: Arc<dyn CoverageGateway>,
    reasoning: Arc<dyn ReasoningGateway>,
    budgets: TokenBudgets,
}

impl AuthorizationPipeline {
    pub fn new(
        criteria: CriteriaDirectory,
        coverage: Arc<dyn CoverageGateway>,
        reasoning: Arc<dyn ReasoningGateway>,
        budgets: TokenBudgets,
    ) -> Self {
        Self {
            criteria,
            coverage,
            reasoning,
            budgets,
        }
    }

    /// Produces a decision for one authorization request.
    ///
    /// Coverage-lookup failures are absorbed by the gateway and malformed
    /// model output degrades inside the extractor, so the only error this can
    /// return is a failed reasoning call.
    pub async fn process_authorization(
        &self,
        request: AuthorizationRequest,
    ) -> Result<AuthorizationDecision, ReasoningServiceError> {
        let started = Instant::now();
        let request_id = domain::new_request_id();

        let criteria = self.criteria.lookup(&request.diagnosis_code);
        let coverage = self
            .coverage
            .lookup(&request.insurance_plan, &request.procedure_code)
            .await;

        let prompt = prompt::decision_prompt(&request_id, &request, criteria, &coverage);
        let completion = self
            .reasoning
            .complete(&prompt, self.budgets.decision)
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let decision = extract::decision_from_completion(request_id, &completion, elapsed_ms);
        info!(
            request_id = %decision.request_id,
            status = decision.status.as_str(),
            confidence = decision.confidence,
            elapsed_ms,
            "authorization decision produced"
        );
        Ok(decision)
    }

    /// Appeal sibling of [`Self::process_authorization`]: same prompt →
    /// reasoning → extract shape with the appeal schema, same failure
    /// contract.
    pub async fn process_appeal(
        &self,
        appeal: AppealRequest,
    ) -> Result<AppealAnalysis, ReasoningServiceError> {
        let appeal_id = domain::new_appeal_id();

        let prompt = prompt::appeal_prompt(&appeal);
        let completion = self.reasoning.complete(&prompt, self.budgets.appeal).await?;

        let analysis = extract::analysis_from_completion(appeal_id, &completion);
        info!(
            appeal_id = %analysis.appeal_id,
            likelihood = analysis.likelihood_of_success,
            "appeal analysis produced"
        );
        Ok(analysis)
    }

    /// Known criteria for a diagnosis code; `None` for unknown codes so the
    /// HTTP layer can answer with a not-found response.
    pub fn criteria_for(&self, diagnosis_code: &str) -> Option<&CriteriaReference> {
        self.criteria.lookup(diagnosis_code)
    }
}
