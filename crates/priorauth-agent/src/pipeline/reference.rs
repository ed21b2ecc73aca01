use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::config::CoverageConfig;

/// Known prior-authorization criteria for a diagnosis code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaReference {
    pub diagnosis_code: String,
    pub name: String,
    pub common_criteria: Vec<String>,
}

/// Immutable in-memory table of diagnosis codes with well-known PA criteria.
/// Built once at startup and shared by reference; lookups are total and an
/// unknown code is an ordinary `None`, never an error.
#[derive(Debug, Clone)]
pub struct CriteriaDirectory {
    entries: HashMap<String, CriteriaReference>,
}

impl CriteriaDirectory {
    /// Simplified MCG/InterQual-like reference set covering the diagnoses the
    /// subnet sees most often.
    pub fn standard() -> Self {
        let seed: &[(&str, &str, &[&str])] = &[
            (
                "Z79.4",
                "Long-term insulin use",
                &[
                    "Type 1 or 2 diabetes diagnosis",
                    "A1c > 7%",
                    "Diet/oral medication failure",
                ],
            ),
            (
                "M54.5",
                "Low back pain",
                &[
                    "6 weeks conservative treatment",
                    "PT failure documented",
                    "Neurological symptoms present",
                ],
            ),
            (
                "F32.1",
                "Major depressive disorder",
                &[
                    "2+ antidepressant failures",
                    "PHQ-9 score > 10",
                    "Psychiatrist evaluation",
                ],
            ),
            (
                "J45.50",
                "Severe persistent asthma",
                &["ICS/LABA failure", "FEV1 < 60%", "2+ exacerbations/year"],
            ),
            (
                "E11.9",
                "Type 2 diabetes",
                &["BMI documented", "Metformin trial", "A1c monitoring"],
            ),
        ];

        let entries = seed
            .iter()
            .map(|(code, name, criteria)| {
                (
                    (*code).to_string(),
                    CriteriaReference {
                        diagnosis_code: (*code).to_string(),
                        name: (*name).to_string(),
                        common_criteria: criteria.iter().map(|c| (*c).to_string()).collect(),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn lookup(&self, diagnosis_code: &str) -> Option<&CriteriaReference> {
        self.entries.get(diagnosis_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a coverage-database lookup. Always produced: transport failures
/// and timeouts collapse into `Fallback` so the remote dependency can never
/// abort the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageLookupResult {
    Criteria {
        source: String,
        payload: serde_json::Value,
    },
    NotFound {
        source: String,
        plan: String,
    },
    Fallback {
        plan: String,
        procedure: String,
    },
}

#[async_trait]
pub trait CoverageGateway: Send + Sync + std::fmt::Debug {
    /// Total lookup: implementations absorb their own failures into
    /// `CoverageLookupResult::Fallback`.
    async fn lookup(&self, plan: &str, procedure: &str) -> CoverageLookupResult;
}

/// Coverage client backed by the public CMS medicare-coverage article search.
#[derive(Debug, Clone)]
pub struct CmsCoverageClient {
    http: reqwest::Client,
    base_url: String,
}

const CMS_SOURCE: &str = "CMS";

impl CmsCoverageClient {
    pub fn new(config: &CoverageConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    #[cfg(test)]
    fn with_base_url(base_url: &str, timeout: std::time::Duration) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client builds"),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl CoverageGateway for CmsCoverageClient {
    async fn lookup(&self, plan: &str, procedure: &str) -> CoverageLookupResult {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("keyword", procedure), ("type", "all"), ("format", "json")])
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<serde_json::Value>().await {
                    Ok(payload) => CoverageLookupResult::Criteria {
                        source: CMS_SOURCE.to_string(),
                        payload,
                    },
                    Err(err) => {
                        warn!(%plan, %procedure, error = %err, "coverage payload unreadable, using fallback");
                        CoverageLookupResult::Fallback {
                            plan: plan.to_string(),
                            procedure: procedure.to_string(),
                        }
                    }
                }
            }
            Ok(response) => {
                warn!(%plan, %procedure, status = %response.status(), "coverage source returned no criteria");
                CoverageLookupResult::NotFound {
                    source: CMS_SOURCE.to_string(),
                    plan: plan.to_string(),
                }
            }
            Err(err) => {
                warn!(%plan, %procedure, error = %err, "coverage lookup failed, using fallback");
                CoverageLookupResult::Fallback {
                    plan: plan.to_string(),
                    procedure: procedure.to_string(),
                }
            }
        }
    }
}
