//! Shared test data.

use committee::{
    Attempt, Band, CommitteeConfig, CommitteeMember, Criterion, Rubric, TaskPayload, TaskType,
};
use serde_json::{Value, json};

pub const ESSAY: &str = "Many people believe that public transport should be free. \
     In my opinion, this would reduce traffic and pollution in large cities. \
     However, governments would need to find the money somewhere else.";

pub fn criterion(id: &str, name: &str) -> Criterion {
    Criterion {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} of the response", name),
        max_score: 5.0,
        bands: vec![
            Band {
                label: "band 1".into(),
                threshold: 0.0,
                score: 1.0,
            },
            Band {
                label: "band 3".into(),
                threshold: 2.5,
                score: 3.0,
            },
            Band {
                label: "band 5".into(),
                threshold: 4.5,
                score: 5.0,
            },
        ],
    }
}

pub fn writing_rubric() -> Rubric {
    Rubric {
        id: "cambridge-b2-writing-v2".into(),
        version: "2".into(),
        provider: "cambridge".into(),
        level: "B2".into(),
        task_type: TaskType::Writing,
        criteria: vec![
            criterion("content", "Content"),
            criterion("communicative_achievement", "Communicative achievement"),
            criterion("organisation", "Organisation"),
            criterion("language", "Language"),
        ],
        pass_threshold: 12.0,
    }
}

pub fn essay_attempt(id: &str) -> Attempt {
    Attempt::new(
        id,
        TaskType::Writing,
        "cambridge",
        "B2",
        TaskPayload {
            text: Some(ESSAY.to_string()),
            task_prompt: Some("Should public transport be free?".into()),
            word_limit: Some(190),
            ..Default::default()
        },
    )
}

pub fn committee_of(provider: &str, models: &[(&str, f64)]) -> CommitteeConfig {
    CommitteeConfig::new(
        models
            .iter()
            .map(|(model, weight)| {
                CommitteeMember::new(*model, provider)
                    .weight(*weight)
                    .seed(42)
            })
            .collect(),
    )
}

/// Judgment JSON as a backend would put it in `message.content`.
pub fn judgment_content(scores: [f64; 4]) -> Value {
    let ids = [
        "content",
        "communicative_achievement",
        "organisation",
        "language",
    ];
    json!({
        "total_score": scores.iter().sum::<f64>(),
        "max_score": 20.0,
        "criteria_scores": ids
            .iter()
            .zip(scores)
            .map(|(id, score)| json!({
                "criterion_id": id,
                "score": score,
                "evidence": [format!("{} is addressed", id)],
                "confidence": 0.85
            }))
            .collect::<Vec<_>>(),
        "overall_feedback": "A clear, well-organised answer.",
        "strengths": ["Clear position"],
        "improvement_areas": ["Use more linking words"],
        "confidence": 0.85
    })
}
