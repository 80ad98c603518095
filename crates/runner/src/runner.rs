//! ModelRunner - sequential prompt submission with retry and checkpointing

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use artifacts::{ArtifactStore, RunLog};
use chrono::Utc;
use contracts::{
    parse_shortlist, Checkpoint, ContractError, ModelConfig, ModelProvider, Persona, PersonaSet,
    Prompt, RankingModel, RankingRequest, Role, RunFailure, RunRecord,
};
use observability::{
    record_retry, record_run_progress, CallOutcome, RunStatsAggregator, RunSummary,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, RunnerError};
use crate::gemini::GeminiModel;
use crate::mock::MockRankingModel;
use crate::retry::RetryPolicy;

/// Model selected by the blueprint's `model.provider`
#[derive(Debug)]
pub enum ConfiguredModel {
    Gemini(GeminiModel),
    Mock(MockRankingModel),
}

impl RankingModel for ConfiguredModel {
    fn name(&self) -> &str {
        match self {
            ConfiguredModel::Gemini(model) => model.name(),
            ConfiguredModel::Mock(model) => model.name(),
        }
    }

    async fn rank(
        &self,
        request: RankingRequest<'_>,
    ) -> std::result::Result<String, ContractError> {
        match self {
            ConfiguredModel::Gemini(model) => model.rank(request).await,
            ConfiguredModel::Mock(model) => model.rank(request).await,
        }
    }
}

/// Build the configured model. Gemini needs at least one API key in
/// `config.api_keys_env`.
pub fn build_model(config: &ModelConfig) -> Result<ConfiguredModel> {
    match config.provider {
        ModelProvider::Gemini => {
            let model = GeminiModel::from_env(config)?;
            info!(
                model = %config.model_name,
                keys = model.key_count(),
                prompts_per_key = config.prompts_per_key,
                "Gemini client ready"
            );
            Ok(ConfiguredModel::Gemini(model))
        }
        ModelProvider::Mock => {
            info!(seed = config.mock_seed, "using mock ranking model");
            Ok(ConfiguredModel::Mock(MockRankingModel::new(config.mock_seed)))
        }
    }
}

/// Run-time knobs of one model run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Process only the first N prompts of the set
    pub limit: Option<usize>,
    /// Pause between consecutive prompts
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl RunOptions {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            limit: None,
            request_delay: Duration::try_from_secs_f64(config.request_delay_secs)
                .unwrap_or_default(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// Result of [`ModelRunner::run`]
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub run_log: PathBuf,
    pub failure_log: PathBuf,
    pub records_written: usize,
    pub failures_written: usize,
    /// Prompts processed so far, including earlier runs
    pub done: usize,
    pub total: usize,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// How one prompt ended
enum PromptOutcome {
    /// A response was received; `parsed` is false when even the last
    /// attempt did not satisfy the shortlist grammar
    Answered {
        text: String,
        attempts: u32,
        parsed: bool,
    },
    /// Retries exhausted or a permanent error
    Failed { attempts: u32, error: ContractError },
}

/// Sequential model runner
pub struct ModelRunner<M> {
    model: M,
    options: RunOptions,
}

impl<M: RankingModel> ModelRunner<M> {
    pub fn new(model: M, options: RunOptions) -> Self {
        Self { model, options }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Submit the role's prompts, resuming after the saved checkpoint.
    ///
    /// A prompt that fails terminally is written to the failure log and the
    /// run continues. Artifact errors abort the run; the checkpoint then
    /// points at the first unprocessed prompt.
    #[instrument(name = "model_runner_run", skip(self, store), fields(role = %role))]
    pub async fn run(&self, store: &mut ArtifactStore, role: Role) -> Result<RunReport> {
        let prompt_set = store.load_prompts(role)?;
        let personas = store.load_personas()?;
        let total = prompt_set.prompts.len();

        let checkpoint = store.load_checkpoint(role)?;
        if checkpoint.done > total {
            warn!(
                done = checkpoint.done,
                total, "checkpoint is past the end of the prompt set"
            );
        }
        let start = checkpoint.done.min(total);
        let end = self.options.limit.map_or(total, |limit| limit.min(total));

        let pending = prompt_set.prompts.get(start..end).unwrap_or_default();
        let snapshots = persona_snapshots(pending, &personas)?;

        let mut stats = RunStatsAggregator::new(role, total);
        stats.record_resumed(start);
        let mut log = RunLog::new(store.layout(), role, Utc::now());

        info!(
            model = self.model.name(),
            total,
            resume_from = start,
            until = end.max(start),
            "model run started"
        );

        let mut done = start;
        for (offset, (prompt, meta)) in pending.iter().zip(snapshots).enumerate() {
            let sequence = start + offset + 1;
            let outcome = self
                .submit(prompt, sequence, prompt_set.shortlist_size, &mut stats)
                .await;

            match outcome {
                PromptOutcome::Answered {
                    text,
                    attempts,
                    parsed,
                } => {
                    let record = RunRecord::new(prompt, meta, text, self.model.name(), attempts);
                    log.append_record(&record)?;
                    stats.record_completed(attempts, parsed);
                }
                PromptOutcome::Failed { attempts, error } => {
                    warn!(
                        scenario_id = %prompt.scenario_id,
                        attempts,
                        error = %error,
                        "prompt failed, continuing with the next one"
                    );
                    log.append_failure(&RunFailure {
                        scenario_id: prompt.scenario_id.clone(),
                        role,
                        attempts,
                        error: error.to_string(),
                        timestamp_utc: Utc::now(),
                    })?;
                    stats.record_failed(attempts);
                }
            }

            done = sequence;
            store.save_checkpoint(role, Checkpoint { done })?;
            record_run_progress(role, done, total);

            if done < end && !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }
        }

        if done >= total {
            store.clear_checkpoint(role)?;
        }

        let report = RunReport {
            summary: stats.summary(),
            run_log: log.record_path().to_path_buf(),
            failure_log: log.failure_path().to_path_buf(),
            records_written: log.records_written(),
            failures_written: log.failures_written(),
            done,
            total,
        };
        info!(
            records = report.records_written,
            failures = report.failures_written,
            done,
            total,
            "model run finished"
        );
        Ok(report)
    }

    /// One prompt with bounded retry
    async fn submit(
        &self,
        prompt: &Prompt,
        sequence: usize,
        shortlist_size: usize,
        stats: &mut RunStatsAggregator,
    ) -> PromptOutcome {
        let role = prompt.role;
        let policy = self.options.retry;
        let candidates = prompt.persona_ids.len();
        let request = RankingRequest {
            scenario_id: &prompt.scenario_id,
            prompt: &prompt.text,
            sequence,
            candidate_count: candidates,
            shortlist_size,
        };

        let mut attempt = 0u32;
        let mut last_text: Option<String> = None;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.model.rank(request).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let delay = match result {
                Ok(text) => match parse_shortlist(&text, candidates) {
                    Ok(_) => {
                        stats.record_call(CallOutcome::Success, latency_ms);
                        debug!(scenario_id = %prompt.scenario_id, attempt, "prompt answered");
                        return PromptOutcome::Answered {
                            text,
                            attempts: attempt,
                            parsed: true,
                        };
                    }
                    Err(reason) => {
                        stats.record_call(CallOutcome::Unparseable, latency_ms);
                        warn!(
                            scenario_id = %prompt.scenario_id,
                            attempt,
                            reason = %reason,
                            "response does not contain a shortlist"
                        );
                        if !policy.allows_retry(attempt) {
                            return PromptOutcome::Answered {
                                text,
                                attempts: attempt,
                                parsed: false,
                            };
                        }
                        last_text = Some(text);
                        policy.backoff(attempt)
                    }
                },
                Err(error) => {
                    stats.record_call(call_outcome(&error), latency_ms);
                    if !error.is_retryable() || !policy.allows_retry(attempt) {
                        // an earlier unparseable answer beats no answer
                        return match last_text {
                            Some(text) => PromptOutcome::Answered {
                                text,
                                attempts: attempt,
                                parsed: false,
                            },
                            None => PromptOutcome::Failed {
                                attempts: attempt,
                                error,
                            },
                        };
                    }
                    warn!(
                        scenario_id = %prompt.scenario_id,
                        attempt,
                        error = %error,
                        "model call failed, retrying"
                    );
                    policy.delay_for(&error, attempt)
                }
            };

            record_retry(role, attempt + 1);
            tokio::time::sleep(delay).await;
        }
    }
}

fn call_outcome(error: &ContractError) -> CallOutcome {
    match error {
        ContractError::RateLimited { .. } => CallOutcome::RateLimited,
        ContractError::ModelTimeout { .. } => CallOutcome::Timeout,
        _ => CallOutcome::Error,
    }
}

/// Attribute snapshot of every prompt's candidates, in presentation order
fn persona_snapshots(prompts: &[Prompt], personas: &PersonaSet) -> Result<Vec<Vec<Persona>>> {
    let index: HashMap<&str, &Persona> = personas
        .personas
        .iter()
        .map(|p| (p.persona_id.as_str(), p))
        .collect();

    prompts
        .iter()
        .map(|prompt| {
            prompt
                .persona_ids
                .iter()
                .map(|id| {
                    index.get(id.as_str()).map(|p| (*p).clone()).ok_or_else(|| {
                        RunnerError::from(ContractError::unknown_persona(
                            id.as_str(),
                            format!("prompt {}", prompt.scenario_id),
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PersonaId, PromptSet, PromptStyle};
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const GOOD: &str = "<explanation>ok</explanation><top-2>1, 3</top-2>";

    /// Replays scripted replies, then answers `GOOD`
    struct ScriptedModel {
        replies: Mutex<VecDeque<std::result::Result<String, ContractError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(replies: Vec<std::result::Result<String, ContractError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RankingModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn rank(
            &self,
            _request: RankingRequest<'_>,
        ) -> std::result::Result<String, ContractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(GOOD.to_string()))
        }
    }

    fn persona(n: usize, group: &str) -> Persona {
        Persona {
            persona_id: PersonaId::numbered(n),
            attributes: BTreeMap::from([("group".to_string(), group.to_string())]),
            marginalized: group == "minority",
        }
    }

    fn prompt(i: usize, ids: &[usize]) -> Prompt {
        let variant = format!("sh0_b{i}_p0");
        Prompt {
            scenario_id: Prompt::scenario_id(&variant, PromptStyle::Formal, Role::Swe),
            variant_id: variant,
            group_id: format!("sh0_b{i}"),
            role: Role::Swe,
            style: PromptStyle::Formal,
            persona_ids: ids.iter().map(|&n| PersonaId::numbered(n)).collect(),
            text: format!("prompt {i}"),
        }
    }

    fn seeded_store(dir: &std::path::Path, prompts: Vec<Prompt>) -> ArtifactStore {
        let mut store = ArtifactStore::new(dir);
        store
            .save_personas(&PersonaSet {
                attributes: vec!["group".to_string()],
                personas: vec![
                    persona(1, "reference"),
                    persona(2, "reference"),
                    persona(3, "minority"),
                    persona(4, "minority"),
                ],
            })
            .unwrap();
        store
            .save_prompts(&PromptSet {
                role: Role::Swe,
                shortlist_size: 2,
                prompts,
            })
            .unwrap();
        store
    }

    fn three_prompts() -> Vec<Prompt> {
        vec![
            prompt(0, &[1, 2, 3, 4]),
            prompt(1, &[4, 3, 2, 1]),
            prompt(2, &[2, 4, 1, 3]),
        ]
    }

    fn options() -> RunOptions {
        RunOptions {
            limit: None,
            request_delay: Duration::ZERO,
            retry: RetryPolicy {
                max_attempts: 3,
                backoff_base_secs: 1.5,
                max_retry_after_secs: 120,
            },
        }
    }

    #[tokio::test]
    async fn test_run_all_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), three_prompts());
        let runner = ModelRunner::new(ScriptedModel::new(vec![]), options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.records_written, 3);
        assert_eq!(report.failures_written, 0);
        assert_eq!(report.summary.completed, 3);

        let records = store.load_run_records(Role::Swe).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].persona_meta[0].persona_id.as_str(), "pers_004");
        assert_eq!(records[1].persona_meta[0].attribute("group"), Some("minority"));
        assert_eq!(records[0].model, "scripted");
        assert_eq!(records[0].attempts, 1);
        // finished runs leave no checkpoint behind
        assert!(!store.layout().checkpoint(Role::Swe).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), vec![prompt(0, &[1, 2, 3, 4])]);
        let model = ScriptedModel::new(vec![
            Err(ContractError::RateLimited {
                retry_after_secs: 5,
            }),
            Err(ContractError::ModelTimeout { timeout_secs: 60 }),
        ]);
        let runner = ModelRunner::new(model, options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(runner.model().calls(), 3);
        assert_eq!(report.summary.rate_limited, 1);
        let records = store.load_run_records(Role::Swe).unwrap();
        assert_eq!(records[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_logged_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), three_prompts());
        let model = ScriptedModel::new(vec![Err(ContractError::ModelApi {
            status: 400,
            message: "bad request".into(),
        })]);
        let runner = ModelRunner::new(model, options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(runner.model().calls(), 3);
        assert_eq!(report.records_written, 2);
        assert_eq!(report.failures_written, 1);
        assert!(report.is_complete());

        let failures: Vec<RunFailure> = artifacts::read_jsonl(&report.failure_log).unwrap();
        assert_eq!(failures[0].scenario_id, "sh0_b0_p0_formal_swe");
        assert_eq!(failures[0].attempts, 1);
        assert!(failures[0].error.contains("bad request"));

        let records = store.load_run_records(Role::Swe).unwrap();
        assert!(records.iter().all(|r| r.scenario_id != "sh0_b0_p0_formal_swe"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), vec![prompt(0, &[1, 2, 3, 4])]);
        let timeout = || Err(ContractError::ModelTimeout { timeout_secs: 60 });
        let model = ScriptedModel::new(vec![timeout(), timeout(), timeout()]);
        let runner = ModelRunner::new(model, options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(runner.model().calls(), 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.records_written, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_reply_is_retried_then_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), vec![prompt(0, &[1, 2, 3, 4])]);
        let refusal = || Ok("I cannot rank people.".to_string());
        let model = ScriptedModel::new(vec![refusal(), refusal(), refusal()]);
        let runner = ModelRunner::new(model, options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(runner.model().calls(), 3);
        assert_eq!(report.summary.unparseable, 1);
        let records = store.load_run_records(Role::Swe).unwrap();
        assert_eq!(records[0].response_text, "I cannot rank people.");
        assert_eq!(records[0].attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_then_retryable_error_keeps_answer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), vec![prompt(0, &[1, 2, 3, 4])]);
        let model = ScriptedModel::new(vec![
            Ok("<top-2>9</top-2>".to_string()),
            Err(ContractError::ModelTransport {
                message: "reset".into(),
            }),
            Err(ContractError::ModelTransport {
                message: "reset".into(),
            }),
        ]);
        let runner = ModelRunner::new(model, options());

        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(report.records_written, 1);
        assert_eq!(report.failures_written, 0);
    }

    #[tokio::test]
    async fn test_limit_then_resume_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), three_prompts());

        let limited = RunOptions {
            limit: Some(2),
            ..options()
        };
        let first = ModelRunner::new(ScriptedModel::new(vec![]), limited);
        let report = first.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(report.done, 2);
        assert!(!report.is_complete());
        assert_eq!(
            store.load_checkpoint(Role::Swe).unwrap(),
            Checkpoint { done: 2 }
        );

        let second = ModelRunner::new(ScriptedModel::new(vec![]), options());
        let report = second.run(&mut store, Role::Swe).await.unwrap();
        assert_eq!(second.model().calls(), 1);
        assert_eq!(report.summary.resumed_from, 2);
        assert!(report.is_complete());
        assert!(!store.layout().checkpoint(Role::Swe).exists());
        assert_eq!(store.load_run_records(Role::Swe).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_persona_aborts_before_calls() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path(), vec![prompt(0, &[1, 2, 3, 99])]);
        let runner = ModelRunner::new(ScriptedModel::new(vec![]), options());

        let err = runner.run(&mut store, Role::Swe).await.unwrap_err();
        assert!(err.to_string().contains("pers_099"));
        assert_eq!(runner.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_prompts_names_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        let runner = ModelRunner::new(ScriptedModel::new(vec![]), options());
        let err = runner.run(&mut store, Role::Hr).await.unwrap_err();
        assert!(err.to_string().contains("prompts"));
    }

    #[test]
    fn test_build_mock_model() {
        let config = ModelConfig {
            provider: ModelProvider::Mock,
            ..ModelConfig::default()
        };
        let model = build_model(&config).unwrap();
        assert_eq!(model.name(), "mock-ranker");
    }
}
