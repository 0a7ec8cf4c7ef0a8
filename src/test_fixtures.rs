//! Builders shared by unit tests.

use crate::model::{
    Attempt, Band, CommitteeConfig, CommitteeMember, Criterion, CriterionJudgment, Judgment,
    Rubric, TaskPayload, TaskType,
};

pub const ESSAY: &str = "Renewable energy is the future. Solar panels are cheaper every year! \
     Wind farms power whole towns. Governments should invest more in storage.";

pub fn criterion(id: &str, max_score: f64) -> Criterion {
    Criterion {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        max_score,
        bands: vec![
            Band {
                label: "low".into(),
                threshold: 0.0,
                score: 1.0,
            },
            Band {
                label: "mid".into(),
                threshold: max_score / 2.0,
                score: max_score / 2.0,
            },
            Band {
                label: "high".into(),
                threshold: max_score * 0.8,
                score: max_score,
            },
        ],
    }
}

/// Two criteria (`content`, `language`), each out of 5, passing at 6.
pub fn rubric() -> Rubric {
    Rubric {
        id: "cambridge-b2-writing".into(),
        version: "1".into(),
        provider: "cambridge".into(),
        level: "B2".into(),
        task_type: TaskType::Writing,
        criteria: vec![criterion("content", 5.0), criterion("language", 5.0)],
        pass_threshold: 6.0,
    }
}

pub fn writing_attempt(text: &str) -> Attempt {
    Attempt::new(
        "attempt-1",
        TaskType::Writing,
        "cambridge",
        "B2",
        TaskPayload {
            text: Some(text.to_string()),
            task_prompt: Some("Write an essay about renewable energy.".into()),
            word_limit: Some(250),
            ..Default::default()
        },
    )
}

pub fn judgment(model: &str, scores: &[(&str, f64)]) -> Judgment {
    Judgment {
        model: model.to_string(),
        provider: "openai".to_string(),
        criteria_scores: scores
            .iter()
            .map(|(id, score)| CriterionJudgment {
                criterion_id: id.to_string(),
                score: *score,
                evidence: vec![format!("{} evidence", id)],
                confidence: 0.9,
            })
            .collect(),
        total_score: scores.iter().map(|(_, s)| s).sum(),
        max_score: 10.0,
        overall_feedback: format!("Feedback from {}", model),
        strengths: vec!["Clear structure".into()],
        improvements: vec!["Vary vocabulary".into()],
        confidence: 0.9,
        processing_time_ms: 100,
        cost_usd: 0.01,
    }
}

/// Pairs judgments with committee indexes in order.
pub fn seated<const N: usize>(judgments: [Judgment; N]) -> Vec<(usize, Judgment)> {
    judgments.into_iter().enumerate().collect()
}

pub fn committee(models: &[(&str, f64)]) -> CommitteeConfig {
    CommitteeConfig::new(
        models
            .iter()
            .map(|(model, weight)| CommitteeMember::new(*model, "openai").weight(*weight))
            .collect(),
    )
}
