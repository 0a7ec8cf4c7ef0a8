use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::error::{PipelineError, PipelineResult, ScorerFailure};
use super::prompt::build_prompt;
use super::validate::validate_attempt;
use crate::cache::{CachePolicy, ResultCacheHandle, model_response_key};
use crate::consensus::ConsensusAggregator;
use crate::hashing::hash_model_request;
use crate::model::{Attempt, CommitteeConfig, CommitteeMember, Judgment, QcReport, Rubric, Score};
use crate::qc::{QcReporter, QcThresholds};
use crate::scorer::{JUDGMENT_SYSTEM_INSTRUCTION, ScorerError, ScorerRegistry, ScoringRequest};
use crate::telemetry::PerformanceRecorder;

/// Default per-scorer timeout.
pub const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 45;
/// Recorder operation name for a whole scoring call.
pub const PIPELINE_OPERATION: &str = "pipeline.score";

/// Recorder operation name for one adapter call.
pub fn scorer_operation(provider: &str, model: &str) -> String {
    format!("scorer.{}.{}", provider, model)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Prompting,
    Scoring,
    Aggregating,
    Reporting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Prompting => "prompting",
            PipelineStage::Scoring => "scoring",
            PipelineStage::Aggregating => "aggregating",
            PipelineStage::Reporting => "reporting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score and QC report of one successful call. Always produced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub score: Score,
    pub qc: QcReport,
}

/// Runs an attempt past a committee of scorers and reconciles the result.
///
/// The cache and recorder are injected so several engines can share (or
/// isolate) them. The engine itself holds no per-call state.
#[derive(Clone)]
pub struct ScoringEngine {
    registry: ScorerRegistry,
    cache: ResultCacheHandle,
    recorder: Arc<PerformanceRecorder>,
    policy: CachePolicy,
    aggregator: ConsensusAggregator,
    reporter: QcReporter,
    scorer_timeout: Duration,
}

impl ScoringEngine {
    pub fn new(
        registry: ScorerRegistry,
        cache: ResultCacheHandle,
        recorder: Arc<PerformanceRecorder>,
    ) -> Self {
        Self {
            registry,
            cache,
            recorder,
            policy: CachePolicy::default(),
            aggregator: ConsensusAggregator::new(),
            reporter: QcReporter::default(),
            scorer_timeout: Duration::from_secs(DEFAULT_SCORER_TIMEOUT_SECS),
        }
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_thresholds(mut self, thresholds: QcThresholds) -> Self {
        self.reporter = QcReporter::new(thresholds);
        self
    }

    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = timeout;
        self
    }

    #[inline]
    pub fn cache(&self) -> &ResultCacheHandle {
        &self.cache
    }

    #[inline]
    pub fn recorder(&self) -> &Arc<PerformanceRecorder> {
        &self.recorder
    }

    #[inline]
    pub fn registry(&self) -> &ScorerRegistry {
        &self.registry
    }

    #[inline]
    pub fn scorer_timeout(&self) -> Duration {
        self.scorer_timeout
    }

    /// Scores `attempt` against `rubric` with every member of `committee`.
    ///
    /// Individual scorer failures only shrink the committee; the call fails
    /// with [`PipelineError::AllScorersFailed`] when nobody answered.
    #[instrument(skip_all, fields(attempt_id = %attempt.id, task = %attempt.task_type, committee = committee.len()))]
    pub async fn score(
        &self,
        attempt: &Attempt,
        rubric: &Rubric,
        committee: &CommitteeConfig,
    ) -> PipelineResult<ScoringOutcome> {
        let started = Instant::now();
        let result = self.run(attempt, rubric, committee, started).await;
        let elapsed = started.elapsed();

        let outcome = match &result {
            Ok(outcome) => {
                info!(
                    total_score = outcome.score.total_score,
                    pass = outcome.score.pass,
                    successful_scorers = outcome.qc.successful_scorers,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "attempt scored"
                );
                "success"
            }
            Err(e) => {
                warn!(stage = %PipelineStage::Failed, error = %e, "scoring failed");
                error_outcome(e)
            }
        };

        let mut metadata = HashMap::new();
        metadata.insert("attempt_id".to_string(), json!(attempt.id));
        metadata.insert("outcome".to_string(), json!(outcome));
        self.recorder.record(PIPELINE_OPERATION, elapsed, metadata);

        result
    }

    async fn run(
        &self,
        attempt: &Attempt,
        rubric: &Rubric,
        committee: &CommitteeConfig,
        started: Instant,
    ) -> PipelineResult<ScoringOutcome> {
        debug!(stage = %PipelineStage::Validating);
        validate_attempt(attempt, committee)?;

        debug!(stage = %PipelineStage::Prompting);
        let prompt = build_prompt(attempt, rubric)?;

        debug!(stage = %PipelineStage::Scoring);
        let results = join_all(
            committee
                .members
                .iter()
                .enumerate()
                .map(|(index, member)| self.score_member(index, member, &prompt, attempt)),
        )
        .await;

        // Judgments keep their committee index so weights follow the member.
        let mut seated = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(judgment) => seated.push((index, judgment)),
                Err(failure) => failures.push(failure),
            }
        }
        if seated.is_empty() {
            return Err(PipelineError::AllScorersFailed { failures });
        }
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                succeeded = seated.len(),
                "continuing with a reduced committee"
            );
        }

        debug!(stage = %PipelineStage::Aggregating, judgments = seated.len());
        let score = self
            .aggregator
            .aggregate(&attempt.id, &seated, committee, rubric)?;
        let judgments: Vec<Judgment> = seated.into_iter().map(|(_, judgment)| judgment).collect();

        debug!(stage = %PipelineStage::Reporting);
        let qc = self
            .reporter
            .report(&judgments, attempt, committee, started.elapsed());

        debug!(stage = %PipelineStage::Done);
        Ok(ScoringOutcome { score, qc })
    }

    /// One member's call: cache, then adapter under a timeout.
    async fn score_member(
        &self,
        index: usize,
        member: &CommitteeMember,
        prompt: &str,
        attempt: &Attempt,
    ) -> Result<Judgment, ScorerFailure> {
        let started = Instant::now();
        let operation = scorer_operation(&member.provider, &member.model);
        let key = model_response_key(&hash_model_request(
            &member.provider,
            &member.model,
            member.temperature,
            member.seed,
            JUDGMENT_SYSTEM_INSTRUCTION,
            prompt,
        ));

        if let Some(mut judgment) = self.cache.get_as::<Judgment>(&key) {
            debug!(model = %member.model, provider = %member.provider, "model response cache hit");
            // Nothing was paid for this answer.
            judgment.cost_usd = 0.0;
            self.record_scorer(&operation, started.elapsed(), attempt, "success", true);
            return Ok(judgment);
        }

        let result = match self.registry.get(&member.provider) {
            Some(scorer) => {
                let request = ScoringRequest {
                    prompt,
                    member,
                    attempt,
                };
                match tokio::time::timeout(self.scorer_timeout, scorer.score(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(ScorerError::BackendUnreachable {
                        provider: member.provider.clone(),
                        message: format!(
                            "timed out after {} ms",
                            self.scorer_timeout.as_millis()
                        ),
                    }),
                }
            }
            None => Err(ScorerError::BackendUnreachable {
                provider: member.provider.clone(),
                message: "no scorer registered for provider".to_string(),
            }),
        };

        match &result {
            Ok(judgment) => {
                if let Err(e) = self
                    .cache
                    .set_as(key, judgment, self.policy.model_response_ttl)
                {
                    warn!(model = %member.model, error = %e, "failed to cache judgment");
                }
                self.record_scorer(&operation, started.elapsed(), attempt, "success", false);
            }
            Err(e) => {
                warn!(
                    index,
                    model = %member.model,
                    provider = %member.provider,
                    error = %e,
                    "scorer failed"
                );
                self.record_scorer(&operation, started.elapsed(), attempt, e.kind(), false);
            }
        }

        result.map_err(|e| ScorerFailure::new(index, &member.model, &member.provider, e))
    }

    fn record_scorer(
        &self,
        operation: &str,
        elapsed: Duration,
        attempt: &Attempt,
        outcome: &str,
        cache_hit: bool,
    ) {
        let metadata: HashMap<String, Value> = HashMap::from([
            ("attempt_id".to_string(), json!(attempt.id)),
            ("outcome".to_string(), json!(outcome)),
            ("cache_hit".to_string(), json!(cache_hit)),
        ]);
        self.recorder.record(operation, elapsed, metadata);
    }
}

fn error_outcome(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::InvalidPayload { .. } => "invalid_payload",
        PipelineError::UnsupportedTask { .. } => "unsupported_task",
        PipelineError::AllScorersFailed { .. } => "all_scorers_failed",
        PipelineError::Consensus(_) => "consensus_error",
    }
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("providers", &self.registry.providers())
            .field("policy", &self.policy)
            .field("thresholds", self.reporter.thresholds())
            .field("scorer_timeout", &self.scorer_timeout)
            .finish_non_exhaustive()
    }
}
