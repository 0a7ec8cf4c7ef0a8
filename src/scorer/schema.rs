//! Strict parsing of backend judgments.
//!
//! Backends return free-form JSON inside `choices[0].message.content`. It is
//! parsed into typed structs and range-checked here so that nothing loosely
//! typed reaches the aggregator.

use std::collections::HashSet;

use async_openai::types::chat::{CompletionUsage, CreateChatCompletionResponse};
use serde::Deserialize;
use tracing::debug;

use super::error::ScorerError;
use crate::model::{CriterionJudgment, Judgment};

const TOTAL_TOLERANCE: f64 = 1e-6;

/// System message attached to every backend call.
pub const JUDGMENT_SYSTEM_INSTRUCTION: &str = r#"You are an expert language examiner on a scoring committee.
Score the candidate response strictly against the rubric you are given.
Respond with a single JSON object and nothing else, using exactly this shape:
{
  "total_score": number,
  "max_score": number,
  "criteria_scores": [
    {
      "criterion_id": string,
      "score": number,
      "evidence": [string],
      "confidence": number between 0 and 1
    }
  ],
  "overall_feedback": string,
  "strengths": [string],
  "improvements": [string],
  "confidence": number between 0 and 1
}
Use one criteria_scores entry per rubric criterion, with the rubric's criterion ids.
Evidence items must quote or paraphrase the candidate response."#;

#[derive(Debug, Clone, Deserialize)]
struct CriterionPayload {
    criterion_id: String,
    score: f64,
    #[serde(default)]
    evidence: Vec<String>,
    confidence: f64,
}

/// A judgment as returned by a backend, validated but not yet attributed.
///
/// The reported `total_score` is not trusted: [`into_judgment`](Self::into_judgment)
/// replaces it with the sum of the criteria scores.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgmentPayload {
    total_score: f64,
    max_score: f64,
    criteria_scores: Vec<CriterionPayload>,
    #[serde(default)]
    overall_feedback: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default, alias = "improvement_areas")]
    improvements: Vec<String>,
    confidence: f64,
}

impl JudgmentPayload {
    /// Attaches scorer identity, timing, and cost.
    pub fn into_judgment(
        self,
        model: &str,
        provider: &str,
        processing_time_ms: u64,
        cost_usd: f64,
    ) -> Judgment {
        let total_score = self.criteria_total();
        if (total_score - self.total_score).abs() > TOTAL_TOLERANCE {
            debug!(
                model,
                reported = self.total_score,
                total_score,
                "reported total differs from criteria sum"
            );
        }
        Judgment {
            model: model.to_string(),
            provider: provider.to_string(),
            criteria_scores: self
                .criteria_scores
                .into_iter()
                .map(|c| CriterionJudgment {
                    criterion_id: c.criterion_id.trim().to_string(),
                    score: c.score,
                    evidence: c.evidence,
                    confidence: c.confidence,
                })
                .collect(),
            total_score,
            max_score: self.max_score,
            overall_feedback: self.overall_feedback,
            strengths: self.strengths,
            improvements: self.improvements,
            confidence: self.confidence,
            processing_time_ms,
            cost_usd,
        }
    }

    fn criteria_total(&self) -> f64 {
        self.criteria_scores.iter().map(|c| c.score).sum()
    }

    fn validate(&self) -> Result<(), String> {
        check_score("total_score", self.total_score)?;
        check_score("max_score", self.max_score)?;
        check_confidence("confidence", self.confidence)?;

        if self.criteria_scores.is_empty() {
            return Err("criteria_scores is empty".to_string());
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria_scores {
            let id = criterion.criterion_id.trim();
            if id.is_empty() {
                return Err("criterion_id is empty".to_string());
            }
            if !seen.insert(id) {
                return Err(format!("duplicate criterion_id '{}'", id));
            }
            check_score(&format!("criteria_scores[{}].score", id), criterion.score)?;
            check_confidence(
                &format!("criteria_scores[{}].confidence", id),
                criterion.confidence,
            )?;
        }
        Ok(())
    }
}

fn check_score(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number, got {}", field, value));
    }
    Ok(())
}

fn check_confidence(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must be within [0, 1], got {}", field, value));
    }
    Ok(())
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses and validates the judgment JSON produced by `model`.
pub fn parse_judgment_content(content: &str, model: &str) -> Result<JudgmentPayload, ScorerError> {
    let invalid = |reason: String| ScorerError::InvalidResponseFormat {
        model: model.to_string(),
        reason,
    };

    let payload: JudgmentPayload =
        serde_json::from_str(strip_code_fence(content)).map_err(|e| invalid(e.to_string()))?;
    payload.validate().map_err(invalid)?;
    Ok(payload)
}

/// Extracts the message content and token usage from a chat-completions body.
pub(crate) fn parse_envelope(
    body: &[u8],
    model: &str,
) -> Result<(String, Option<CompletionUsage>), ScorerError> {
    let invalid = |reason: String| ScorerError::InvalidResponseFormat {
        model: model.to_string(),
        reason,
    };

    let response: CreateChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| invalid(format!("bad envelope: {}", e)))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| invalid("response has no message content".to_string()))?;
    Ok((content, response.usage))
}
