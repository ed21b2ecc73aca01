use metrics_exporter_prometheus::PrometheusHandle;
use priorauth_agent::config::AppConfig;
use priorauth_agent::error::AppError;
use priorauth_agent::pipeline::{
    AnthropicMessagesClient, AuthorizationPipeline, CmsCoverageClient, CriteriaDirectory,
    TokenBudgets,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the live gateways into a pipeline. The criteria directory is built
/// once here and shared read-only for the life of the process.
pub(crate) fn build_pipeline(config: &AppConfig) -> Result<Arc<AuthorizationPipeline>, AppError> {
    let coverage = CmsCoverageClient::new(&config.coverage)?;
    let reasoning = AnthropicMessagesClient::new(&config.reasoning)?;

    Ok(Arc::new(AuthorizationPipeline::new(
        CriteriaDirectory::standard(),
        Arc::new(coverage),
        Arc::new(reasoning),
        TokenBudgets {
            decision: config.reasoning.decision_max_tokens,
            appeal: config.reasoning.appeal_max_tokens,
        },
    )))
}
