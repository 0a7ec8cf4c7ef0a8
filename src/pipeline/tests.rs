use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::cache::{CachePolicy, ResultCacheHandle};
use crate::model::{Attempt, CommitteeConfig, CommitteeMember, QualityFlag, TaskPayload, TaskType};
use crate::scorer::{MockScorer, ScorerError, ScorerRegistry};
use crate::telemetry::PerformanceRecorder;
use crate::test_fixtures::{ESSAY, committee, judgment, rubric, writing_attempt};

fn engine_with(mock: Arc<MockScorer>) -> ScoringEngine {
    let registry = ScorerRegistry::new().with_scorer("openai", mock);
    ScoringEngine::new(
        registry,
        ResultCacheHandle::new(),
        Arc::new(PerformanceRecorder::new()),
    )
}

fn three_member_mock() -> MockScorer {
    MockScorer::new("openai")
        .respond("a", judgment("a", &[("content", 4.0), ("language", 4.0)]))
        .respond("b", judgment("b", &[("content", 4.0), ("language", 3.0)]))
        .respond("c", judgment("c", &[("content", 4.0), ("language", 3.5)]))
}

#[tokio::test]
async fn test_full_committee_scores_attempt() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone());

    let outcome = engine
        .score(
            &writing_attempt(ESSAY),
            &rubric(),
            &committee(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.score.attempt_id, "attempt-1");
    assert_eq!(outcome.score.criteria_scores[0].score, 4.0);
    assert_eq!(outcome.score.criteria_scores[1].score, 3.5);
    assert_eq!(outcome.score.total_score, 7.5);
    assert!(outcome.score.pass);
    assert_eq!(outcome.qc.committee_size, 3);
    assert_eq!(outcome.qc.successful_scorers, 3);
    assert!(!outcome.qc.has_flag(QualityFlag::IncompleteCommittee));
    assert_eq!(mock.total_calls(), 3);
}

#[tokio::test]
async fn test_members_sharing_a_model_are_weighted_separately() {
    let mock = Arc::new(
        MockScorer::new("openai")
            .respond("m", judgment("m", &[("content", 4.0), ("language", 3.0)])),
    );
    let engine = engine_with(mock.clone());
    let attempt = writing_attempt(ESSAY);
    let rubric = rubric();
    let committee = CommitteeConfig::new(vec![
        CommitteeMember::new("m", "openai").temperature(0.0).weight(0.9),
        CommitteeMember::new("m", "openai").temperature(1.0).weight(0.1),
    ]);

    // The second member's answer is already cached with a lower content score.
    let prompt = crate::pipeline::build_prompt(&attempt, &rubric).unwrap();
    let key = crate::cache::model_response_key(&crate::hashing::hash_model_request(
        "openai",
        "m",
        1.0,
        None,
        crate::scorer::JUDGMENT_SYSTEM_INSTRUCTION,
        &prompt,
    ));
    engine
        .cache()
        .set_as(
            key,
            &judgment("m", &[("content", 2.0), ("language", 3.0)]),
            Duration::from_secs(60),
        )
        .unwrap();

    let outcome = engine.score(&attempt, &rubric, &committee).await.unwrap();

    assert_eq!(mock.calls("m"), 1);
    assert_eq!(outcome.score.criteria_scores[0].score, 3.8);
    assert_eq!(outcome.score.criteria_scores[1].score, 3.0);
}

#[tokio::test]
async fn test_partial_failure_reduces_committee() {
    let mock = Arc::new(
        MockScorer::new("openai")
            .respond("a", judgment("a", &[("content", 4.0), ("language", 4.0)]))
            .respond("b", judgment("b", &[("content", 3.0), ("language", 3.0)]))
            .fail(
                "c",
                ScorerError::BackendRejected {
                    provider: "openai".into(),
                    status: 500,
                    message: "overloaded".into(),
                },
            ),
    );
    let engine = engine_with(mock);

    let outcome = engine
        .score(
            &writing_attempt(ESSAY),
            &rubric(),
            &committee(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]),
        )
        .await
        .unwrap();

    assert!(outcome.qc.has_flag(QualityFlag::IncompleteCommittee));
    assert_eq!(outcome.qc.successful_scorers, 2);
    assert_eq!(outcome.qc.committee_size, 3);
    assert_eq!(outcome.score.criteria_scores[0].score, 3.5);
    assert!(!outcome.qc.model_costs.contains_key("c"));
}

#[tokio::test]
async fn test_all_scorers_failed() {
    let mock = Arc::new(
        MockScorer::new("openai")
            .fail(
                "a",
                ScorerError::InvalidResponseFormat {
                    model: "a".into(),
                    reason: "not json".into(),
                },
            )
            .fail(
                "b",
                ScorerError::BackendUnreachable {
                    provider: "openai".into(),
                    message: "connection refused".into(),
                },
            ),
    );
    let engine = engine_with(mock);

    let err = engine
        .score(
            &writing_attempt(ESSAY),
            &rubric(),
            &committee(&[("a", 1.0), ("b", 1.0)]),
        )
        .await
        .unwrap_err();

    match err {
        PipelineError::AllScorersFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].index, 0);
            assert_eq!(failures[0].model, "a");
            assert_eq!(failures[0].error.kind(), "invalid_response_format");
            assert_eq!(failures[1].index, 1);
            assert_eq!(failures[1].provider, "openai");
            assert_eq!(failures[1].error.kind(), "backend_unreachable");
        }
        other => panic!("expected AllScorersFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identical_calls_hit_model_response_cache() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone());
    let attempt = writing_attempt(ESSAY);
    let committee = committee(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);

    let first = engine.score(&attempt, &rubric(), &committee).await.unwrap();
    let second = engine.score(&attempt, &rubric(), &committee).await.unwrap();

    assert_eq!(mock.calls("a"), 1);
    assert_eq!(mock.calls("b"), 1);
    assert_eq!(mock.calls("c"), 1);
    assert_eq!(first.score.criteria_scores, second.score.criteria_scores);
    assert_eq!(first.score.total_score, second.score.total_score);
    assert_eq!(second.qc.total_cost_usd, 0.0);
    assert_eq!(engine.cache().len(), 3);
}

#[tokio::test]
async fn test_cache_key_changes_with_member_settings() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone());
    let attempt = writing_attempt(ESSAY);

    let cold = crate::model::CommitteeConfig::new(vec![CommitteeMember::new("a", "openai")]);
    let warm = crate::model::CommitteeConfig::new(vec![
        CommitteeMember::new("a", "openai").temperature(0.7),
    ]);

    engine.score(&attempt, &rubric(), &cold).await.unwrap();
    engine.score(&attempt, &rubric(), &warm).await.unwrap();

    assert_eq!(mock.calls("a"), 2);
}

#[tokio::test]
async fn test_expired_model_responses_are_refetched() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone()).with_cache_policy(CachePolicy {
        model_response_ttl: Duration::ZERO,
        ..CachePolicy::default()
    });
    let attempt = writing_attempt(ESSAY);
    let committee = committee(&[("a", 1.0)]);

    engine.score(&attempt, &rubric(), &committee).await.unwrap();
    engine.score(&attempt, &rubric(), &committee).await.unwrap();

    assert_eq!(mock.calls("a"), 2);
}

#[tokio::test]
async fn test_slow_scorer_times_out_as_unreachable() {
    let mock = Arc::new(
        MockScorer::new("openai")
            .respond("a", judgment("a", &[("content", 4.0), ("language", 4.0)]))
            .respond_after(
                "slow",
                Duration::from_secs(5),
                judgment("slow", &[("content", 1.0), ("language", 1.0)]),
            ),
    );
    let engine = engine_with(mock).with_scorer_timeout(Duration::from_millis(50));

    let outcome = engine
        .score(
            &writing_attempt(ESSAY),
            &rubric(),
            &committee(&[("a", 1.0), ("slow", 1.0)]),
        )
        .await
        .unwrap();

    assert!(outcome.qc.has_flag(QualityFlag::IncompleteCommittee));
    assert_eq!(outcome.score.total_score, 8.0);
}

#[tokio::test]
async fn test_timeout_failure_is_reported() {
    let mock = Arc::new(MockScorer::new("openai").respond_after(
        "slow",
        Duration::from_secs(5),
        judgment("slow", &[("content", 1.0)]),
    ));
    let engine = engine_with(mock).with_scorer_timeout(Duration::from_millis(20));

    let err = engine
        .score(&writing_attempt(ESSAY), &rubric(), &committee(&[("slow", 1.0)]))
        .await
        .unwrap_err();

    let PipelineError::AllScorersFailed { failures } = err else {
        panic!("expected AllScorersFailed");
    };
    assert!(matches!(
        &failures[0].error,
        ScorerError::BackendUnreachable { message, .. } if message.contains("timed out")
    ));
}

#[tokio::test]
async fn test_unregistered_provider_is_unreachable() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock);
    let committee = crate::model::CommitteeConfig::new(vec![
        CommitteeMember::new("a", "openai"),
        CommitteeMember::new("claude", "anthropic"),
    ]);

    let outcome = engine
        .score(&writing_attempt(ESSAY), &rubric(), &committee)
        .await
        .unwrap();

    assert_eq!(outcome.qc.successful_scorers, 1);
    assert!(outcome.qc.has_flag(QualityFlag::IncompleteCommittee));
}

#[tokio::test]
async fn test_short_text_rejected_before_scoring() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone());

    let err = engine
        .score(
            &writing_attempt("Too short."),
            &rubric(),
            &committee(&[("a", 1.0)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidPayload { .. }));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_empty_committee_rejected() {
    let engine = engine_with(Arc::new(three_member_mock()));

    let err = engine
        .score(&writing_attempt(ESSAY), &rubric(), &committee(&[]))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidPayload { .. }));
}

#[tokio::test]
async fn test_objective_tasks_are_unsupported() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock.clone());
    let attempt = Attempt::new(
        "reading-1",
        TaskType::Reading,
        "cambridge",
        "B2",
        TaskPayload {
            answers: Some(json!({"q1": "A", "q2": "C"})),
            ..Default::default()
        },
    );

    let err = engine
        .score(&attempt, &rubric(), &committee(&[("a", 1.0)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::UnsupportedTask {
            task: TaskType::Reading
        }
    ));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_recorder_captures_pipeline_and_scorer_operations() {
    let mock = Arc::new(three_member_mock());
    let engine = engine_with(mock);
    let attempt = writing_attempt(ESSAY);
    let committee = committee(&[("a", 1.0), ("b", 1.0)]);

    engine.score(&attempt, &rubric(), &committee).await.unwrap();
    let _ = engine
        .score(&writing_attempt("short"), &rubric(), &committee)
        .await;

    let recorder = engine.recorder();
    assert_eq!(recorder.stats(PIPELINE_OPERATION, None).unwrap().count, 2);
    assert_eq!(
        recorder
            .stats(&scorer_operation("openai", "a"), None)
            .unwrap()
            .count,
        1
    );

    let outcomes: Vec<_> = recorder
        .measurements(None)
        .into_iter()
        .filter(|m| m.name == PIPELINE_OPERATION)
        .map(|m| m.metadata["outcome"].clone())
        .collect();
    assert_eq!(outcomes, vec![json!("success"), json!("invalid_payload")]);
}

#[test]
fn test_validation_rules() {
    let one_member = committee(&[("a", 1.0)]);
    let speaking = |audio: Option<&str>, transcript: Option<&str>| {
        Attempt::new(
            "s1",
            TaskType::Speaking,
            "cambridge",
            "B2",
            TaskPayload {
                audio_url: audio.map(str::to_string),
                transcript: transcript.map(str::to_string),
                ..Default::default()
            },
        )
    };

    assert!(validate_attempt(&writing_attempt(ESSAY), &one_member).is_ok());
    assert!(validate_attempt(&writing_attempt(&"x".repeat(49)), &one_member).is_err());
    assert!(validate_attempt(&writing_attempt(&"x".repeat(50)), &one_member).is_ok());
    assert!(
        validate_attempt(
            &writing_attempt(&format!("   {}   ", "x".repeat(49))),
            &one_member
        )
        .is_err()
    );

    assert!(validate_attempt(&speaking(Some("https://a/1.mp3"), None), &one_member).is_ok());
    assert!(validate_attempt(&speaking(None, Some("I enjoy hiking a lot.")), &one_member).is_ok());
    assert!(validate_attempt(&speaking(None, Some("Hello.")), &one_member).is_err());
    assert!(validate_attempt(&speaking(Some("  "), None), &one_member).is_err());

    let mut listening = Attempt::new(
        "l1",
        TaskType::Listening,
        "cambridge",
        "B2",
        TaskPayload::default(),
    );
    assert!(validate_attempt(&listening, &one_member).is_err());
    listening.payload.answers = Some(serde_json::Value::Null);
    assert!(validate_attempt(&listening, &one_member).is_err());
    listening.payload.answers = Some(json!(["B"]));
    assert!(validate_attempt(&listening, &one_member).is_ok());
}

#[test]
fn test_prompts_embed_rubric_and_payload() {
    let attempt = writing_attempt(ESSAY);
    let prompt = build_prompt(&attempt, &rubric()).unwrap();

    assert!(prompt.contains("cambridge-b2-writing"));
    assert!(prompt.contains("CEFR level: B2"));
    assert!(prompt.contains("Word limit: 250"));
    assert!(prompt.contains("Solar panels are cheaper every year!"));
    assert!(prompt.contains("Write an essay about renewable energy."));

    let again = build_prompt(&attempt, &rubric()).unwrap();
    assert_eq!(prompt, again);
}

#[test]
fn test_speaking_and_mediation_prompts() {
    let speaking = Attempt::new(
        "s1",
        TaskType::Speaking,
        "trinity",
        "C1",
        TaskPayload {
            audio_url: Some("https://audio.example/s1.mp3".into()),
            ..Default::default()
        },
    );
    let prompt = build_prompt(&speaking, &rubric()).unwrap();
    assert!(prompt.contains("https://audio.example/s1.mp3"));
    assert!(prompt.contains("No transcript"));

    let mut mediation = writing_attempt(ESSAY);
    mediation.task_type = TaskType::Mediation;
    let prompt = build_prompt(&mediation, &rubric()).unwrap();
    assert!(prompt.contains("mediation"));
    assert!(prompt.contains("Source material"));
}

#[test]
fn test_unsupported_prompt_types() {
    for task in [TaskType::Reading, TaskType::Listening, TaskType::UseOfEnglish] {
        let mut attempt = writing_attempt(ESSAY);
        attempt.task_type = task;
        let err = build_prompt(&attempt, &rubric()).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedTask { task: t } if t == task));
    }
}

#[test]
fn test_stage_names() {
    assert_eq!(PipelineStage::Validating.to_string(), "validating");
    assert_eq!(PipelineStage::Done.to_string(), "done");
    assert_eq!(PipelineStage::Failed.as_str(), "failed");
}
