use super::domain::{AuthorizationDecision, DecisionStatus};

const CONFIDENCE_WEIGHT: f64 = 0.4;
const RATIONALE_WEIGHT: f64 = 0.3;
/// Rationale length at which the thoroughness component saturates.
const RATIONALE_SATURATION_CHARS: f64 = 200.0;
const ALTERNATIVES_WEIGHT: f64 = 0.2;
const ALTERNATIVES_SATURATION: f64 = 3.0;
const APPEAL_GUIDANCE_BONUS: f64 = 0.1;
const GROUND_TRUTH_MATCH_BONUS: f64 = 0.3;
const GROUND_TRUTH_MISMATCH_PENALTY: f64 = 0.1;

/// Validator reward for a decision, in [0.0, 1.0]. Pure and total: it never
/// fails and has no dependency on how the decision was produced.
///
/// Rubric, applied in order and clamped once at the end: confidence (40%),
/// rationale thoroughness saturating at 200 characters (30%), suggested
/// alternatives saturating at three (20%), a 0.1 bonus for denials that carry
/// appeal guidance, and an optional ground-truth adjustment of +0.3 on a
/// polarity match or -0.1 on a mismatch.
pub fn score_decision(decision: &AuthorizationDecision, ground_truth: Option<bool>) -> f64 {
    let mut score = decision.confidence * CONFIDENCE_WEIGHT;

    let rationale_chars = decision.rationale.chars().count() as f64;
    score += (rationale_chars / RATIONALE_SATURATION_CHARS).min(1.0) * RATIONALE_WEIGHT;

    let alternatives = decision.alternative_recommendations.len() as f64;
    score += (alternatives / ALTERNATIVES_SATURATION).min(1.0) * ALTERNATIVES_WEIGHT;

    let guidance_present = decision
        .appeal_guidance
        .as_deref()
        .is_some_and(|guidance| !guidance.trim().is_empty());
    if decision.status == DecisionStatus::Denied && guidance_present {
        score += APPEAL_GUIDANCE_BONUS;
    }

    if let Some(truth) = ground_truth {
        score += if decision.status.is_approval() == truth {
            GROUND_TRUTH_MATCH_BONUS
        } else {
            -GROUND_TRUTH_MISMATCH_PENALTY
        };
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_decision() -> AuthorizationDecision {
        AuthorizationDecision {
            request_id: "PA-TEST1234".to_string(),
            status: DecisionStatus::Approved,
            decision: "approved".to_string(),
            rationale: String::new(),
            criteria_met: Vec::new(),
            criteria_missing: Vec::new(),
            alternative_recommendations: Vec::new(),
            appeal_guidance: None,
            confidence: 0.0,
            processing_time_ms: 0,
        }
    }

    #[test]
    fn confidence_component_is_weighted() {
        let mut decision = base_decision();
        decision.confidence = 0.5;
        assert!((score_decision(&decision, None) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn monotonically_non_decreasing_in_confidence() {
        let mut previous = -1.0;
        for step in 0..=20 {
            let mut decision = base_decision();
            decision.rationale = "r".repeat(100);
            decision.confidence = f64::from(step) / 20.0;
            let score = score_decision(&decision, None);
            assert!(score >= previous, "score regressed at step {step}");
            previous = score;
        }
    }

    #[test]
    fn rationale_component_saturates_at_200_chars() {
        let mut decision = base_decision();
        decision.rationale = "x".repeat(100);
        assert!((score_decision(&decision, None) - 0.15).abs() < 1e-9);

        decision.rationale = "x".repeat(200);
        assert!((score_decision(&decision, None) - 0.3).abs() < 1e-9);

        decision.rationale = "x".repeat(5000);
        assert!((score_decision(&decision, None) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn alternatives_component_saturates_at_three() {
        let mut decision = base_decision();
        decision.alternative_recommendations = vec!["a".to_string()];
        assert!((score_decision(&decision, None) - 0.2 / 3.0).abs() < 1e-9);

        decision.alternative_recommendations =
            (0..10).map(|i| format!("alternative {i}")).collect();
        assert!((score_decision(&decision, None) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn appeal_guidance_bonus_applies_only_to_denials() {
        let mut denied = base_decision();
        denied.status = DecisionStatus::Denied;
        denied.appeal_guidance = Some("submit imaging".to_string());
        assert!((score_decision(&denied, None) - 0.1).abs() < 1e-9);

        let mut approved = base_decision();
        approved.appeal_guidance = Some("submit imaging".to_string());
        assert!(score_decision(&approved, None).abs() < 1e-9);

        let mut blank = base_decision();
        blank.status = DecisionStatus::Denied;
        blank.appeal_guidance = Some("   ".to_string());
        assert!(score_decision(&blank, None).abs() < 1e-9);
    }

    #[test]
    fn ground_truth_gap_is_exactly_point_four_before_clamping() {
        let mut decision = base_decision();
        decision.confidence = 0.5;

        let matched = score_decision(&decision, Some(true));
        let mismatched = score_decision(&decision, Some(false));
        assert!((matched - mismatched - 0.4).abs() < 1e-9);
    }

    #[test]
    fn pending_info_counts_as_non_approval_for_ground_truth() {
        let mut decision = base_decision();
        decision.status = DecisionStatus::PendingInfo;
        decision.confidence = 0.5;

        let against_denial_truth = score_decision(&decision, Some(false));
        let against_approval_truth = score_decision(&decision, Some(true));
        assert!(against_denial_truth > against_approval_truth);
    }

    #[test]
    fn score_stays_in_unit_interval_over_input_grid() {
        for confidence in [0.0, 0.25, 0.5, 1.0] {
            for rationale_len in [0usize, 199, 200, 10_000] {
                for alternatives in [0usize, 1, 3, 50] {
                    for ground_truth in [None, Some(true), Some(false)] {
                        let mut decision = base_decision();
                        decision.status = DecisionStatus::Denied;
                        decision.appeal_guidance = Some("appeal with new evidence".to_string());
                        decision.confidence = confidence;
                        decision.rationale = "r".repeat(rationale_len);
                        decision.alternative_recommendations =
                            (0..alternatives).map(|i| format!("alt {i}")).collect();

                        let score = score_decision(&decision, ground_truth);
                        assert!((0.0..=1.0).contains(&score), "score {score} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn mismatch_penalty_cannot_push_below_zero() {
        let decision = base_decision();
        assert_eq!(score_decision(&decision, Some(false)), 0.0);
    }
}
